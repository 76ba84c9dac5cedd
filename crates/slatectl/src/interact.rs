//! Terminal prompts and the interactive SSH connector.

use owo_colors::OwoColorize;
use slate_common::{Connector, Credential, Interaction, RemoteTransport, SlateError, Transport};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

/// Prompt implementation for a real terminal.
#[derive(Debug, Default)]
pub struct TerminalInteraction;

impl Interaction for TerminalInteraction {
    fn confirm(&self, prompt: &str, default_yes: bool) -> io::Result<bool> {
        let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
        loop {
            print!("{} {}  ", prompt.bright_white(), hint.dimmed());
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().lock().read_line(&mut input)?;

            match input.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                "" => return Ok(default_yes),
                _ => println!("   {}  Please answer 'y' or 'n'", "!".yellow()),
            }
        }
    }

    fn ask(&self, prompt: &str) -> io::Result<String> {
        print!("{}: ", prompt.bright_white());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    fn notify(&self, message: &str) {
        println!("   {}  {}", "!".yellow(), message);
    }
}

/// SSH connector with interactive credential retry. An `--auth` value is
/// tried first (key file when it names one, password otherwise); rejection
/// falls back to prompting until the operator gives up with ctrl-c.
pub struct SshConnector {
    auth: Option<String>,
    interaction: TerminalInteraction,
}

impl SshConnector {
    pub fn new(auth: Option<String>) -> Self {
        Self {
            auth,
            interaction: TerminalInteraction,
        }
    }
}

impl Connector for SshConnector {
    fn connect(&self, host: &str) -> Result<Arc<dyn Transport>, SlateError> {
        if let Some(raw) = &self.auth {
            match RemoteTransport::connect(host, &Credential::infer(raw)) {
                Ok(transport) => {
                    println!("{}  Connected to device", "+".bright_green());
                    return Ok(Arc::new(transport));
                }
                Err(SlateError::Authentication { .. }) => {
                    println!(
                        "   {}  The password or key given with --auth was rejected",
                        "!".yellow()
                    );
                }
                Err(other) => return Err(other),
            }
        }

        loop {
            let credential = if self
                .interaction
                .confirm("Connect with a password?", true)?
            {
                Credential::Password(self.interaction.ask("Device SSH password")?)
            } else {
                let path = self.interaction.ask("Path to SSH private key")?;
                if !Path::new(&path).is_file() {
                    println!("   {}  No such file: {}", "!".yellow(), path);
                    continue;
                }
                Credential::KeyFile(path.into())
            };

            match RemoteTransport::connect(host, &credential) {
                Ok(transport) => {
                    println!("{}  Connected to device", "+".bright_green());
                    return Ok(Arc::new(transport));
                }
                Err(SlateError::Authentication { .. }) => {
                    println!("   {}  Authentication failed, try again", "!".yellow());
                }
                Err(other) => return Err(other),
            }
        }
    }
}
