#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT, // Also EXIT
    HELP,
    NOOP,
    CWD,
    PWD,
    PORT,
    LIST,
    RETR,
    STOR,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" | "EXIT" => Some(FtpCommand::QUIT),
            "HELP" => Some(FtpCommand::HELP),
            "NOOP" => Some(FtpCommand::NOOP),
            "CWD" => Some(FtpCommand::CWD),
            "PWD" => Some(FtpCommand::PWD),
            "PORT" => Some(FtpCommand::PORT),
            "LIST" => Some(FtpCommand::LIST),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            _ => None,
        }
    }

    /// Commands accepted before login completes.
    pub fn requires_auth(self) -> bool {
        !matches!(
            self,
            FtpCommand::USER
                | FtpCommand::PASS
                | FtpCommand::QUIT
                | FtpCommand::HELP
                | FtpCommand::NOOP
        )
    }
}

/// A command line split into its verb and trailing argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub verb: String, // Upper-cased
    pub arg: String,  // Verbatim, empty when absent
}

impl ParsedCommand {
    pub fn command(&self) -> Option<FtpCommand> {
        FtpCommand::from_str(&self.verb)
    }

    /// The command as it may appear in logs. PASS arguments are masked.
    pub fn loggable(&self) -> String {
        if self.verb == "PASS" {
            "PASS ****".to_string()
        } else if self.arg.is_empty() {
            self.verb.clone()
        } else {
            format!("{} {}", self.verb, self.arg)
        }
    }
}

/// Splits one control line. Returns `None` for blank lines, which get no reply.
pub fn parse_command_line(line: &str) -> Option<ParsedCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (verb, arg) = match line.find(char::is_whitespace) {
        Some(index) => (&line[..index], line[index..].trim_start()),
        None => (line, ""),
    };

    Some(ParsedCommand {
        verb: verb.to_ascii_uppercase(),
        arg: arg.to_string(),
    })
}
