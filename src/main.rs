use clap::{ArgAction, Parser, ValueEnum};
use pushbox::session::LevelStats;
use pushbox::{Direction, LevelOrder, Levels, MoveOutcome, Session, SessionConfig};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Order {
    Sequential,
    Shuffled,
}

impl From<Order> for LevelOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Sequential => LevelOrder::Sequential,
            Order::Shuffled => LevelOrder::Shuffled,
        }
    }
}

#[derive(Parser)]
#[command(name = "pushbox")]
#[command(about = "Play box-pushing puzzles in the terminal", long_about = None)]
struct Args {
    /// Path to the levels file
    #[arg(value_name = "FILE")]
    levels_file: PathBuf,

    /// Level to start at (1-indexed, in play order)
    #[arg(value_name = "LEVEL", default_value = "1")]
    level: usize,

    /// Order in which levels are played
    #[arg(short, long, value_enum, default_value = "sequential")]
    order: Order,

    /// Seed for the shuffled order
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of restarts per level
    #[arg(short = 'r', long)]
    max_restarts: Option<u32>,

    /// Number of leading levels played as practice
    #[arg(short, long, default_value = "0")]
    practice: usize,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

enum Command {
    Moves(Vec<Direction>),
    Restart,
    Next,
    Previous,
    Goto(usize),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    match line {
        "q" | "quit" => return Some(Command::Quit),
        "r" | "restart" => return Some(Command::Restart),
        "n" | "next" => return Some(Command::Next),
        "p" | "prev" => return Some(Command::Previous),
        _ => {}
    }
    if let Some(arg) = line.strip_prefix('g') {
        return arg.trim().parse().ok().map(Command::Goto);
    }
    let moves: Option<Vec<Direction>> = line
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .map(Direction::from_char)
        .collect();
    moves.filter(|m| !m.is_empty()).map(Command::Moves)
}

fn render(session: &Session) {
    let game = session.game();
    let title = session
        .title()
        .map(|t| format!(" ({})", t))
        .unwrap_or_default();
    let restarts = match session.restarts_remaining() {
        Some(left) => format!("  restarts left: {}", left),
        None => String::new(),
    };
    println!(
        "\nLevel {}/{}{} [{}]  moves: {}{}",
        session.position() + 1,
        session.len(),
        title,
        session.stage(),
        game.moves(),
        restarts
    );
    print!("{}", game);
    if game.is_solved() {
        println!("Solved in {} moves! Enter 'n' for the next level.", game.moves());
    }
}

fn print_summary(stats: &[LevelStats]) {
    println!("---");
    for (i, s) in stats.iter().enumerate() {
        let solved = match s.solved_in {
            Some(moves) => format!("Y in {:<5}", moves),
            None => "N         ".to_string(),
        };
        println!(
            "level: {:<3}  solved: {}  moves: {:<6}  restarts: {}",
            i + 1,
            solved,
            s.total_moves,
            s.restarts
        );
    }
}

fn run(mut session: Session) -> io::Result<()> {
    let stdin = io::stdin();
    render(&session);

    for line in stdin.lock().lines() {
        let line = line?;
        let Some(command) = parse_command(&line) else {
            println!("Commands: w/a/s/d move, r restart, n next, p previous, g N go to level, q quit");
            continue;
        };

        let result = match command {
            Command::Quit => break,
            Command::Moves(dirs) => {
                for dir in dirs {
                    if let MoveOutcome::Rejected = session.apply_move(dir) {
                        debug!(%dir, "ignored");
                    }
                }
                Ok(())
            }
            Command::Restart => session.restart(),
            Command::Next => session.next_level(),
            Command::Previous => session.previous_level(),
            Command::Goto(n) => session.select(n.saturating_sub(1)),
        };

        if let Err(e) = result {
            println!("{}", e);
        }
        render(&session);

        if session.is_complete() {
            println!("All levels complete!");
            break;
        }
        io::stdout().flush()?;
    }

    print_summary(session.stats());
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Load levels from file
    let levels = match Levels::from_file(&args.levels_file) {
        Ok(levels) => levels,
        Err(e) => {
            eprintln!("Error loading levels: {}", e);
            std::process::exit(1);
        }
    };

    if args.level == 0 {
        eprintln!("Error: level numbers must be at least 1");
        std::process::exit(1);
    }

    let config = SessionConfig {
        order: args.order.into(),
        seed: args.seed,
        max_restarts: args.max_restarts,
        practice_levels: args.practice,
    };

    let mut session = match Session::new(levels, config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if args.level > 1 {
        if let Err(e) = session.select(args.level - 1) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = run(session) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
