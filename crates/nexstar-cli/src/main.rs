/*!
# NexStar Console

Interactive console for a NexStar-family telescope mount on a serial port.

## Usage

```bash
# list serial ports
nexstar --list

# connect to the only port, or the one in the config file
nexstar

# connect to a named port or an index from --list
nexstar --port /dev/ttyUSB0
nexstar --port 1
```

Type `help` at the prompt for the command list.
*/

use anyhow::{bail, Context, Result};
use clap::Parser;
use nexstar_core::prelude::*;
use nexstar_core::protocol::{auto_select_port, list_ports, port_names};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry, EnvFilter};

mod init_script;
mod repl;

use init_script::{InitScript, MOUNT_SECTION};
use repl::Outcome;

#[derive(Parser)]
#[command(name = "nexstar")]
#[command(about = "Interactive console for NexStar telescope mounts")]
#[command(version)]
struct Cli {
    /// Serial port name, or an index into the --list output
    #[arg(short, long)]
    port: Option<String>,

    /// Connection settings file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Init script; defaults to <config dir>/nexstar/init
    #[arg(long)]
    init: Option<PathBuf>,

    /// List serial ports and exit
    #[arg(long)]
    list: bool,

    /// Log protocol traffic
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<ConnectionConfig> {
    if let Some(path) = path {
        return ConnectionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()));
    }
    match ConnectionConfig::default_path() {
        Some(path) if path.exists() => ConnectionConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display())),
        _ => Ok(ConnectionConfig::default()),
    }
}

/// Pick the port: explicit argument (name or index), then config, then the only port present
fn resolve_port(arg: Option<&str>, configured: &str, ports: &[String]) -> Result<String> {
    if let Some(arg) = arg {
        if let Ok(index) = arg.parse::<usize>() {
            return match ports.get(index) {
                Some(name) => Ok(name.clone()),
                None => bail!("port index {index} out of range ({} ports)", ports.len()),
            };
        }
        return Ok(arg.to_string());
    }
    if !configured.is_empty() {
        return Ok(configured.to_string());
    }
    Ok(auto_select_port(ports)?)
}

fn run_script(script: &InitScript, section: &str, mount: &Mount) -> Result<()> {
    let mut stdout = io::stdout();
    for line in script.script(section) {
        println!("script> {line}");
        if repl::execute(line, mount, &mut stdout)? == Outcome::Unknown {
            println!("Unknown command: {line}");
        }
    }
    Ok(())
}

fn load_script(path: Option<PathBuf>) -> Option<InitScript> {
    let explicit = path.is_some();
    let path = path.or_else(InitScript::default_path)?;
    if !explicit && !path.exists() {
        return None;
    }
    match InitScript::load(&path) {
        Ok(script) => Some(script),
        Err(err) => {
            println!("Couldn't open init script, not running: {err:#}");
            None
        }
    }
}

fn try_main(cli: Cli) -> Result<()> {
    if cli.list {
        for (index, port) in list_ports().iter().enumerate() {
            println!("[{index}] {}", port.name);
        }
        return Ok(());
    }

    let mut config = load_config(cli.config.as_ref())?;
    config.port_name = resolve_port(cli.port.as_deref(), &config.port_name, &port_names())?;

    let mount = Mount::with_config(&config)
        .with_context(|| format!("opening {}", config.port_name))?;
    println!("Opened mount connection: {}", config.port_name);

    if let Some(script) = load_script(cli.init) {
        if let Err(err) = run_script(&script, MOUNT_SECTION, &mount) {
            println!("Error: {err:#}");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("> ");
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        match repl::execute(&line, &mount, &mut stdout) {
            Ok(Outcome::Quit) => break,
            Ok(Outcome::Unknown) => println!("Unknown command: {line}"),
            Ok(Outcome::Continue) => {}
            Err(err) => println!("Error: {err:#}"),
        }
        print!("> ");
        stdout.flush()?;
    }

    mount.close()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = try_main(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ports() -> Vec<String> {
        vec!["/dev/ttyUSB0".to_string(), "/dev/ttyUSB1".to_string()]
    }

    #[test]
    fn test_port_by_index() {
        assert_eq!(resolve_port(Some("1"), "", &ports()).unwrap(), "/dev/ttyUSB1");
        assert!(resolve_port(Some("2"), "", &ports()).is_err());
    }

    #[test]
    fn test_port_by_name_wins_over_config() {
        assert_eq!(
            resolve_port(Some("COM4"), "/dev/ttyUSB0", &ports()).unwrap(),
            "COM4"
        );
    }

    #[test]
    fn test_port_from_config() {
        assert_eq!(
            resolve_port(None, "/dev/ttyACM0", &ports()).unwrap(),
            "/dev/ttyACM0"
        );
    }

    #[test]
    fn test_port_auto_select_needs_exactly_one() {
        assert!(resolve_port(None, "", &ports()).is_err());
        assert!(resolve_port(None, "", &[]).is_err());
        assert_eq!(
            resolve_port(None, "", &ports()[..1]).unwrap(),
            "/dev/ttyUSB0"
        );
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connection.json");
        ConnectionConfig::for_port("/dev/ttyUSB7").save(&path).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap().port_name, "/dev/ttyUSB7");
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from(["nexstar", "--port", "2", "-v", "--init", "/tmp/init"]);
        assert_eq!(cli.port.as_deref(), Some("2"));
        assert!(cli.verbose);
        assert!(!cli.list);
        assert_eq!(cli.init, Some(PathBuf::from("/tmp/init")));
    }
}
