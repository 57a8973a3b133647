/// One simple command: the first word names it, the rest are its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(name: &str, args: &[&str]) -> Self {
        CommandLine {
            name: name.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Split collected words into name and arguments. `None` for no words.
    pub fn from_words(mut words: Vec<String>) -> Option<Self> {
        if words.is_empty() {
            return None;
        }
        let name = words.remove(0);
        Some(CommandLine { name, args: words })
    }
}
