use std::{
    error::Error,
    io::{self, IsTerminal},
    path::PathBuf,
    str::FromStr,
};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kilate::{CallParam, Config, Environment, KilateError, Runtime, Value};

#[derive(Parser)]
#[command(author, version, about = "Kilate native function host")]
struct Args {
    /// TOML file listing plugin directories
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Extra directory to scan for plugins (repeatable)
    #[arg(long = "plugin-dir", global = true)]
    plugin_dirs: Vec<PathBuf>,
    /// Log registrations and plugin loading
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every registered native function with its signature
    Natives,
    /// Invoke a native function; an argument written `$name` is a variable reference
    Call {
        name: String,
        args: Vec<String>,
        /// Bind an int variable
        #[arg(long = "int", value_name = "NAME=VALUE", value_parser = binding::<i32>)]
        ints: Vec<(String, i32)>,
        /// Bind a long variable
        #[arg(long = "long", value_name = "NAME=VALUE", value_parser = binding::<i64>)]
        longs: Vec<(String, i64)>,
        /// Bind a float variable
        #[arg(long = "float", value_name = "NAME=VALUE", value_parser = binding::<f32>)]
        floats: Vec<(String, f32)>,
        /// Bind a string variable
        #[arg(long = "string", value_name = "NAME=VALUE", value_parser = binding::<String>)]
        strings: Vec<(String, String)>,
        /// Bind a bool variable
        #[arg(long = "bool", value_name = "NAME=VALUE", value_parser = binding::<bool>)]
        bools: Vec<(String, bool)>,
    },
}

fn main() -> Result<(), KilateError> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.natives.directories.extend(args.plugin_dirs);
    let config = config.with_env_directories();

    let runtime = Runtime::with_config(&config);
    let outcome = match args.command {
        Command::Natives => {
            for entry in runtime.registry().entries() {
                println!("{entry}");
            }
            Ok(())
        }
        Command::Call {
            name,
            args,
            ints,
            longs,
            floats,
            strings,
            bools,
        } => {
            let env = Environment::new();
            {
                let mut scope = env.borrow_mut();
                for (var, value) in ints {
                    scope.define(var, Value::Int(value));
                }
                for (var, value) in longs {
                    scope.define(var, Value::Long(value));
                }
                for (var, value) in floats {
                    scope.define(var, Value::Float(value));
                }
                for (var, value) in strings {
                    scope.define(var, Value::String(value));
                }
                for (var, value) in bools {
                    scope.define(var, Value::Bool(value));
                }
            }
            let params = args.into_iter().map(call_param).collect();
            runtime.invoke(&name, params, &env).map(|result| {
                if let Some(value) = result {
                    println!("{value}");
                }
            })
        }
    };
    runtime.shutdown();
    outcome
}

fn call_param(arg: String) -> CallParam {
    match arg.strip_prefix('$') {
        Some(name) if !name.is_empty() => CallParam::variable(name),
        _ => CallParam::Literal(arg),
    }
}

fn binding<T>(raw: &str) -> Result<(String, T), Box<dyn Error + Send + Sync + 'static>>
where
    T: FromStr,
    T::Err: Error + Send + Sync + 'static,
{
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, found `{raw}`"))?;
    Ok((name.to_owned(), value.parse()?))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "kilate=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}
