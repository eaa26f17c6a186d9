/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The downsizer command-line tool.
//!
//! Reads a JSON config file naming a project tree, a set of app directories,
//! and one or more stylesheets; scans the tree's markup, prunes each
//! stylesheet down to the rules that markup can reach, and writes the pruned
//! output next to a gzip-compressed copy.

mod config;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::{env, process};

use flate2::write::GzEncoder;
use flate2::Compression;
use getopts::{Matches, Options};
use log::{error, info, warn};
use purge::{parse_safelist, purge_stylesheet, Safelist, UsageData};

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::new();
    opts.optopt(
        "c",
        "config",
        "Path to the JSON configuration file",
        "downsizer.json",
    );
    opts.optmulti(
        "",
        "css",
        "Input CSS file, overriding the configured list",
        "app.css",
    );
    opts.optopt(
        "o",
        "output",
        "Output directory, overriding the configured one",
        "DIR",
    );
    opts.optopt(
        "",
        "safelist",
        "Safelist file, overriding the configured one",
        "FILE",
    );
    opts.optflag(
        "",
        "no-compress",
        "Skip writing gzip-compressed copies of the pruned output",
    );
    opts.optflag("v", "verbose", "Log per-file summaries without RUST_LOG set");
    opts.optflag("h", "help", "Print this help message and exit");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            eprintln!("{}", failure);
            print_usage(&args[0], &opts);
            process::exit(2);
        },
    };

    let mut logger = env_logger::Builder::from_default_env();
    if matches.opt_present("verbose") {
        logger.filter_level(log::LevelFilter::Info);
    }
    logger.init();

    if matches.opt_present("h") {
        print_usage(&args[0], &opts);
        return;
    }

    if let Err(message) = run(&matches) {
        error!("{}", message);
        process::exit(1);
    }
}

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options]", program);
    print!("{}", opts.usage(&brief));
}

fn run(matches: &Matches) -> Result<(), String> {
    let config_path = matches
        .opt_str("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("downsizer.json"));
    let mut config = config::load(&config_path).map_err(|error| error.to_string())?;

    let css_overrides = matches.opt_strs("css");
    if !css_overrides.is_empty() {
        config.input_css_files = css_overrides.into_iter().map(PathBuf::from).collect();
    }
    if let Some(output) = matches.opt_str("output") {
        config.output_directory = PathBuf::from(output);
    }
    if let Some(safelist) = matches.opt_str("safelist") {
        config.safelist_file = Some(PathBuf::from(safelist));
    }
    if matches.opt_present("no-compress") {
        config.compress = false;
    }

    let mut documents = Vec::new();
    collect_markup(
        &config.project_directory,
        &config.apps,
        &config.exclude_dirs,
        &mut documents,
    )
    .map_err(|error| {
        format!(
            "failed to scan {}: {}",
            config.project_directory.display(),
            error
        )
    })?;
    info!("scanning {} markup documents", documents.len());
    let tokens = purge::extract_corpus(&documents);

    let safelist = load_safelist(config.safelist_file.as_deref())?;
    let usage = UsageData::new(tokens, safelist);

    fs::create_dir_all(&config.output_directory).map_err(|error| {
        format!(
            "cannot create output directory {}: {}",
            config.output_directory.display(),
            error
        )
    })?;

    let mut failures = 0;
    for css_path in &config.input_css_files {
        if let Err(message) =
            process_stylesheet(css_path, &config.output_directory, config.compress, &usage)
        {
            // One broken stylesheet does not abort the batch.
            error!("{}: {}", css_path.display(), message);
            failures += 1;
        }
    }
    if failures > 0 && failures == config.input_css_files.len() {
        return Err("no stylesheet could be processed".to_owned());
    }
    Ok(())
}

fn load_safelist(path: Option<&Path>) -> Result<Safelist, String> {
    let path = match path {
        Some(path) => path,
        None => return Ok(Safelist::default()),
    };
    let text = fs::read_to_string(path)
        .map_err(|error| format!("cannot read safelist {}: {}", path.display(), error))?;
    let (rules, mut errors) = parse_safelist(&text);
    let (safelist, compile_errors) = Safelist::compile(rules);
    errors.extend(compile_errors);
    for error in &errors {
        warn!("{}: {}", path.display(), error);
    }
    Ok(safelist)
}

/// Recursively collect the text of every markup document under `root` that
/// belongs to one of the configured apps.
fn collect_markup(
    root: &Path,
    apps: &[String],
    exclude: &[String],
    documents: &mut Vec<String>,
) -> io::Result<()> {
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_markup(&path, apps, exclude, documents)?;
            continue;
        }
        if path.extension().is_none_or(|extension| extension != "html") {
            continue;
        }
        let path_text = path.to_string_lossy();
        let included = apps.is_empty() || apps.iter().any(|app| path_text.contains(app.as_str()));
        let excluded = exclude.iter().any(|name| path_text.contains(name.as_str()));
        if !included || excluded {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(text) => documents.push(text),
            Err(error) => warn!("skipping unreadable {}: {}", path.display(), error),
        }
    }
    Ok(())
}

fn process_stylesheet(
    css_path: &Path,
    output_dir: &Path,
    compress: bool,
    usage: &UsageData,
) -> Result<(), String> {
    let css = fs::read_to_string(css_path).map_err(|error| format!("read failed: {}", error))?;
    let output = purge_stylesheet(&css, usage).map_err(|error| error.to_string())?;
    let summary = output.summary;

    let stem = css_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("stylesheet");
    let purged_path = output_dir.join(format!("{}-purged.css", stem));
    fs::write(&purged_path, output.css.as_bytes())
        .map_err(|error| format!("cannot write {}: {}", purged_path.display(), error))?;
    info!(
        "{}: kept {}/{} rules, {} -> {} bytes, wrote {}",
        css_path.display(),
        summary.rules_kept,
        summary.rules_total,
        summary.bytes_before,
        summary.bytes_after,
        purged_path.display(),
    );
    if summary.rules_total > 0 && summary.rules_kept * 20 < summary.rules_total {
        warn!(
            "{}: kept under 5% of rules; check the configured apps and safelist",
            css_path.display()
        );
    }

    if compress {
        let gz_path = output_dir.join(format!("{}-purged.css.gz", stem));
        let file = File::create(&gz_path)
            .map_err(|error| format!("cannot create {}: {}", gz_path.display(), error))?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(output.css.as_bytes())
            .map_err(|error| format!("cannot write {}: {}", gz_path.display(), error))?;
        encoder
            .finish()
            .map_err(|error| format!("cannot write {}: {}", gz_path.display(), error))?;
        info!("compressed file saved as {}", gz_path.display());
    }
    Ok(())
}
