use std::process::exit;

pub struct Command {
    pub kind: CommandKind,
}

#[derive(Clone, Debug)]
pub enum CommandKind {
    Inspect(InspectCommand),
}

#[derive(Clone, Debug)]
pub struct InspectCommand {
    pub filename: String,
    pub options: InspectOptions,
}

#[derive(Clone, Debug, Default)]
pub struct InspectOptions {
    pub show_testable: bool,
}

impl Command {
    pub fn parse_env_args() -> Result<Self, ()> {
        let mut args = std::env::args().skip(1).peekable();

        match args.peek().map(|string| string.as_str()) {
            None | Some("-h") | Some("--help") => {
                show_help();
                exit(0);
            }
            Some("inspect") => Self::parse_inspect(args),
            Some(other) => {
                eprintln!("error: Unknown command '{}'", other);
                Err(())
            }
        }
    }

    fn parse_inspect(mut args: impl Iterator<Item = String>) -> Result<Self, ()> {
        // Skip over the 'inspect' command keyword
        args.next().unwrap();

        let mut filename = None;
        let mut options = InspectOptions::default();

        for option in args {
            if option == "--testable" {
                options.show_testable = true;
            } else if filename.is_some() {
                eprintln!("error: Multiple interface files specified");
                return Err(());
            } else {
                filename = Some(option);
            }
        }

        let Some(filename) = filename else {
            eprintln!("error: No interface file specified");
            return Err(());
        };

        Ok(Self {
            kind: CommandKind::Inspect(InspectCommand { filename, options }),
        })
    }
}

fn show_help() {
    println!("usage: implicits inspect [--testable] MODULE_INTERFACE_FILE");
}
