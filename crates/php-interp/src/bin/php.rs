use clap::Parser;
use php_interp::{Ini, Interpreter, Request};
use std::io::{Read, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "php")]
#[command(about = "Interpreter for a PHP-subset scripting language", long_about = None)]
struct Cli {
    /// Script file to run; stdin is read when omitted.
    #[arg(name = "FILE")]
    file: Option<PathBuf>,

    /// Run code directly (without open tags).
    #[arg(short = 'r', long = "run", value_name = "CODE")]
    code: Option<String>,

    /// Ini overrides, key=value.
    #[arg(short = 'd', value_name = "DIRECTIVE")]
    directives: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut overrides = Vec::new();
    for directive in &cli.directives {
        let (key, value) = directive
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid -d directive: {}", directive))?;
        overrides.push((key.to_string(), value.to_string()));
    }
    let ini = Ini::dev_with_overrides(&overrides)
        .map_err(|err| anyhow::anyhow!("{}", err))?;

    let (source, filename) = if let Some(code) = cli.code {
        (format!("<?php {}", code).into_bytes(), "Command line code".to_string())
    } else if let Some(path) = cli.file {
        let source = std::fs::read(&path)?;
        (source, path.to_string_lossy().into_owned())
    } else {
        let mut source = Vec::new();
        std::io::stdin().read_to_end(&mut source)?;
        (source, "Standard input code".to_string())
    };

    let mut interpreter = Interpreter::new(ini, Request::from_process_env(), &filename);
    let (output, _) = interpreter.process(&source);

    std::io::stdout().write_all(&output)?;
    std::process::exit(interpreter.exit_code());
}
