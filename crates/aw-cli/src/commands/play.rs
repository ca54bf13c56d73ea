use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use tokio::runtime::Runtime;

use aw_core::{ActiveScreen, ItemId, LogKind, NodeId};
use aw_narrative::{ChatCompletionsClient, ServiceConfig};
use aw_session::{GameEngine, SessionConfig};

const RECENT_LOG: usize = 12;

const HELP: &str = "
  <n>            pick choice n
  say <text>     act freely; companions respond
  use <item>     use an item (number, id, or name)
  move <node>    walk to an adjacent map node (id or name)
  inv            show the inventory
  map            show the dungeon map
  party          show the party
  log            show recent log entries
  look           show the current scene again
  screen <name>  switch screen: main, inventory, status, settings
  reset          start over
  quit           leave (the session is saved)";

pub fn run(
    save_dir: &Path,
    seed: Option<u64>,
    offline: bool,
    enemy_delay_ms: u64,
) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {e}"))?;

    let mut config =
        SessionConfig::default().with_enemy_delay(Duration::from_millis(enemy_delay_ms));
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    let service = if offline {
        None
    } else {
        ChatCompletionsClient::new(&ServiceConfig::from_env())
    };
    let mut engine = GameEngine::new(config);
    if let Some(client) = service {
        engine = engine.with_service(Arc::new(client));
    }
    let engine = engine.with_store(super::open_store(save_dir));
    tracing::debug!(online = engine.is_online(), dir = %save_dir.display(), "session opened");

    println!("  {} Abyss Walker", "Entering".bold());
    println!(
        "  Narrator: {} | Save: {}",
        if engine.is_online() { "online" } else { "offline" },
        save_dir.display()
    );
    println!("  Type 'help' for commands, 'quit' to exit.");

    let mut play = Play::new(engine, runtime);
    // A saved session may stop mid-round.
    play.settle()?;
    super::print_scene(play.engine.game());

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "quit" | "q" | "exit") {
            break;
        }

        if let Err(e) = play.handle(input) {
            println!("  {}\n", e.yellow());
        }
    }

    Ok(())
}

struct Play {
    engine: GameEngine,
    runtime: Runtime,
    /// Log entries already shown.
    seen: usize,
}

impl Play {
    fn new(engine: GameEngine, runtime: Runtime) -> Self {
        let seen = engine.game().log().len();
        Self {
            engine,
            runtime,
            seen,
        }
    }

    fn handle(&mut self, input: &str) -> Result<(), String> {
        let (command, arg) = match input.split_once(char::is_whitespace) {
            Some((c, rest)) => (c, rest.trim()),
            None => (input, ""),
        };

        match command {
            "help" | "h" | "?" => println!("{HELP}\n"),
            "inv" | "inventory" => super::print_inventory(self.engine.game()),
            "map" => super::print_map(self.engine.game()),
            "party" => super::print_party(self.engine.game()),
            "log" => super::print_entries(self.engine.game().log().recent(RECENT_LOG)),
            "look" => super::print_scene(self.engine.game()),
            "say" => {
                self.runtime
                    .block_on(self.engine.submit_action(arg))
                    .map_err(|e| e.to_string())?;
                self.flush_log();
            }
            "use" => {
                let id = self.find_item(required(arg, "use <item>")?);
                self.engine.use_item(&id).map_err(|e| e.to_string())?;
                self.flush_log();
            }
            "move" => {
                let id = self.find_node(required(arg, "move <node>")?);
                self.engine
                    .move_to_scene_node(&id)
                    .map_err(|e| e.to_string())?;
                self.flush_log();
            }
            "screen" => {
                let name = required(arg, "screen <name>")?;
                let screen =
                    ActiveScreen::parse(name).ok_or_else(|| format!("unknown screen '{name}'"))?;
                self.engine.set_active_screen(screen);
                println!("  Screen: {screen}");
            }
            "reset" => {
                self.engine.reset_session();
                self.seen = self.engine.game().log().len();
                println!("  {}", "Session reset.".bold());
                super::print_scene(self.engine.game());
            }
            other => match other.parse::<usize>() {
                Ok(n) => self.choose(n)?,
                Err(_) => return Err(format!("unknown command '{other}' (type 'help')")),
            },
        }
        Ok(())
    }

    fn choose(&mut self, n: usize) -> Result<(), String> {
        let choices = self.engine.game().current_scene().choices();
        let id = n
            .checked_sub(1)
            .and_then(|i| choices.get(i))
            .map(|c| c.id.clone())
            .ok_or_else(|| format!("no choice {n} (1-{})", choices.len()))?;

        self.runtime
            .block_on(self.engine.submit_choice(&id))
            .map_err(|e| e.to_string())?;
        self.flush_log();
        Ok(())
    }

    /// Finish a round the saved session stopped in.
    fn settle(&mut self) -> Result<(), String> {
        if self.engine.game().is_player_turn() {
            return Ok(());
        }
        println!("  {}", "……".dimmed());
        self.runtime
            .block_on(self.engine.settle())
            .map_err(|e| e.to_string())?;
        self.flush_log();
        Ok(())
    }

    /// Print log entries added since the last call. A new scene entry
    /// shows the scene view instead of its raw text.
    fn flush_log(&mut self) {
        let entries = self.engine.game().log().entries();
        let fresh = &entries[self.seen.min(entries.len())..];
        super::print_entries(fresh.iter().filter(|e| e.kind != LogKind::Scene));
        let new_scene = fresh.iter().any(|e| e.kind == LogKind::Scene);
        self.seen = entries.len();

        if new_scene {
            super::print_scene(self.engine.game());
        }
    }

    fn find_item(&self, query: &str) -> ItemId {
        let items = self.engine.game().inventory().items();
        let found = match query.parse::<usize>() {
            Ok(n) => n.checked_sub(1).and_then(|i| items.get(i)),
            Err(_) => items
                .iter()
                .find(|item| item.id.as_str() == query || item.name == query),
        };
        found.map_or_else(|| ItemId::from(query), |item| item.id.clone())
    }

    fn find_node(&self, query: &str) -> NodeId {
        self.engine
            .game()
            .graph()
            .nodes()
            .iter()
            .find(|node| node.id.as_str() == query || node.name == query)
            .map_or_else(|| NodeId::from(query), |node| node.id.clone())
    }
}

fn required<'a>(arg: &'a str, usage: &str) -> Result<&'a str, String> {
    if arg.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(arg)
    }
}
