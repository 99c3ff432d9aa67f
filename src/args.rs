use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Mode {
    /// Run the card tracker with hotkey-driven macro control
    Track,
    Screenshot,
    Record { save_to: Option<PathBuf> },
    Replay { file: PathBuf, loop_count: u32 },
}

/// What the tracker does when every card reaches its required count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionChoice {
    /// Hold the confirm key for ~2s, then release
    ConfirmKey,
    /// Stop an in-progress macro replay
    StopReplay,
}

#[derive(Debug)]
pub struct Args {
    pub mode: Mode,
    pub debug_mode: bool,
    pub debug_mode_timeout_secs: Option<u64>,
    pub image_dir: PathBuf,
    pub config_file: PathBuf,
    pub on_complete: CompletionChoice,
    pub speed_factor: f64,
    pub countdown_secs: u32,
}

impl Args {
    pub fn parse() -> Option<Self> {
        let args: Vec<String> = env::args().collect();

        let mut mode: Option<Mode> = None;
        let mut debug_mode: bool = false;
        let mut timeout_secs: Option<u64> = None;
        let mut image_dir = PathBuf::from("image");
        let mut config_file = PathBuf::from("config.txt");
        let mut on_complete = CompletionChoice::ConfirmKey;
        let mut speed_factor: f64 = 1.0;
        let mut countdown_secs: u32 = 5;
        let mut replay_file: Option<PathBuf> = None;
        let mut loop_count: u32 = 1;

        for arg in args.iter().skip(1) {
            if arg == "--help" || arg == "-h" {
                print_help();
                return None;
            } else if arg == "--version" || arg == "-v" {
                println!("Card Macro Run v{}", env!("APP_VERSION_DISPLAY"));
                return None;
            } else if arg == "--debug" {
                debug_mode = true;
            } else if arg == "--track" {
                mode = Some(Mode::Track);
            } else if arg == "--screenshot" || arg == "-s" {
                mode = Some(Mode::Screenshot);
            } else if arg == "--record" {
                mode = Some(Mode::Record { save_to: None });
            } else if let Some(val) = arg.strip_prefix("--record=") {
                mode = Some(Mode::Record {
                    save_to: Some(PathBuf::from(val)),
                });
            } else if let Some(val) = arg.strip_prefix("--replay=") {
                replay_file = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--loops=") {
                match val.parse::<u32>() {
                    Ok(count) => loop_count = count,
                    Err(_) => {
                        eprintln!("❌ Invalid loop count: {}", val);
                        return None;
                    }
                }
            } else if let Some(val) = arg.strip_prefix("--on-complete=") {
                on_complete = match val {
                    "key" => CompletionChoice::ConfirmKey,
                    "stop-replay" => CompletionChoice::StopReplay,
                    other => {
                        eprintln!("❌ Unknown completion action '{}', expected 'key' or 'stop-replay'", other);
                        return None;
                    }
                };
            } else if let Some(val) = arg.strip_prefix("--images=") {
                image_dir = PathBuf::from(val);
            } else if let Some(val) = arg.strip_prefix("--config=") {
                config_file = PathBuf::from(val);
            } else if let Some(val) = arg.strip_prefix("--speed=") {
                match val.parse::<f64>() {
                    Ok(factor) if factor > 0.0 => speed_factor = factor,
                    _ => {
                        eprintln!("❌ Invalid speed factor: {}", val);
                        return None;
                    }
                }
            } else if let Some(val) = arg.strip_prefix("--countdown=") {
                match val.parse::<u32>() {
                    Ok(secs) => countdown_secs = secs,
                    Err(_) => {
                        eprintln!("❌ Invalid countdown value: {}", val);
                        return None;
                    }
                }
            } else if let Some(val) = arg.strip_prefix("--timeout=") {
                match val.parse::<u64>() {
                    Ok(secs) => timeout_secs = Some(secs),
                    Err(_) => {
                        eprintln!("❌ Invalid timeout value: {}", val);
                        return None;
                    }
                }
            } else {
                eprintln!("❌ Unknown argument: {}", arg);
                print_help();
                return None;
            }
        }

        let mode = match (mode, replay_file) {
            (Some(mode), None) => mode,
            (None, Some(file)) => Mode::Replay { file, loop_count },
            (None, None) => Mode::Track,
            (Some(_), Some(_)) => {
                eprintln!("❌ --replay cannot be combined with another mode");
                return None;
            }
        };

        Some(Args {
            mode,
            debug_mode,
            debug_mode_timeout_secs: timeout_secs,
            image_dir,
            config_file,
            on_complete,
            speed_factor,
            countdown_secs,
        })
    }
}

fn print_help() {
    println!("🃏 Card Macro Run");
    println!();
    println!("USAGE:");
    println!("    card-macro-run [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    (no flags)              Run the card tracker");
    println!("    --track                 Run the card tracker");
    println!("    --screenshot, -s        Capture the screen once to cli-screenshot.png");
    println!("    --record[=FILE]         Record a macro (saved to FILE, default recording.txt)");
    println!("    --replay=FILE           Replay a recorded macro");
    println!("    --loops=N               Replay loop count; 0 repeats until stopped (default: 1)");
    println!("    --speed=F               Replay speed factor (default: 1.0)");
    println!("    --countdown=N           Countdown seconds before record/replay (default: 5)");
    println!("    --on-complete=MODE      Tracker completion action: 'key' or 'stop-replay'");
    println!("    --images=DIR            Card image directory (default: image)");
    println!("    --config=FILE           Target list file (default: config.txt)");
    println!("    --debug                 Enable debug output");
    println!("    --timeout=N             Auto-exit after N seconds (for testing)");
    println!("    --help, -h              Show this help message");
    println!("    --version, -v           Show version information");
    println!();
    println!("HOTKEYS (while tracking):");
    println!("    F5 record | F6 stop recording | F7 replay looped | F9 replay counted");
    println!("    F8 stop replay | F10 cancel all and exit");
    println!();
    println!("EXAMPLES:");
    println!("    card-macro-run --screenshot");
    println!("    card-macro-run --track --on-complete=stop-replay");
    println!("    card-macro-run --record=run1.txt --countdown=10");
    println!("    card-macro-run --replay=run1.txt --loops=0 --speed=1.5");
}
