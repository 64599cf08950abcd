#![deny(unused_must_use)]
use std::{env, path::PathBuf, rc::Rc};

use colored::Colorize;
use ember::{
    analyzer::{analyze, dump::dump_module, AnalyzerConfig},
    parser::Parser,
    source::EmberSource,
};
use lasso::Rodeo;

const USAGE: &str = "usage: ember <file> [--dump]";

fn config_from_env() -> AnalyzerConfig {
    let mut config = AnalyzerConfig::default();
    if let Ok(v) = env::var("EMBER_MAX_LOCALS") {
        match v.parse() {
            Ok(n) => config.max_locals = n,
            Err(_) => log::warn!("ignoring invalid EMBER_MAX_LOCALS `{}`", v),
        }
    }
    config
}

fn main() {
    env_logger::init();

    let mut path = None;
    let mut dump = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--dump" => dump = true,
            _ if path.is_none() => path = Some(PathBuf::from(arg)),
            _ => {
                eprintln!("{}", USAGE);
                std::process::exit(2);
            }
        }
    }
    let Some(path) = path else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let src = match EmberSource::from_file(&path) {
        Ok(src) => Rc::new(src),
        Err(err) => {
            eprintln!("{} {}: {}", "error:".bright_red().bold(), path.display(), err);
            std::process::exit(1);
        }
    };

    let mut interner = Rodeo::default();
    let mut module = match Parser::new(&src, &mut interner).parse() {
        Ok(m) => m,
        Err(err) => {
            err.into_report().display();
            std::process::exit(1);
        }
    };

    let config = config_from_env();
    let errors = match analyze(&mut module, &mut interner, &config) {
        Ok(errors) => errors,
        Err(err) => {
            eprintln!("{} {}", "internal error:".bright_red().bold(), err);
            std::process::exit(101);
        }
    };

    if dump {
        println!("{}", dump_module(&module, &interner));
    }

    if errors.is_empty() {
        println!(
            "{} {} ({} locals)",
            "ok".bright_green().bold(),
            src.name().bright_blue(),
            module.info.local_count
        );
        return;
    }

    let count = errors.len();
    for err in errors {
        log::debug!("{}", err);
        err.into_report().display();
    }
    println!(
        "\n{}",
        format!("{} semantic error(s)", count).bright_red().bold()
    );
    std::process::exit(1);
}
