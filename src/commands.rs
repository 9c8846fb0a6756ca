/// A line typed into the terminal front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "start" | "s" => Some(Command::Start),
            "stop" => Some(Command::Stop),
            "help" | "h" | "?" => Some(Command::Help),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

pub const HELP: &str = "commands: start (s) | stop | help (h) | quit (q)";
