//zcode-workspace/src/main.rs
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use zcode_workspace::models::{NoChangeTags, NodeId, WorkspaceTree};
use zcode_workspace::services::{
    ensure_config_file, load_config, IconTable, LocalEnumerator, PlainIconTable,
};
use zcode_workspace::MatchOptions;

mod logging;

const DEFAULT_DEPTH: i32 = 3;
const WATCH_TICK: Duration = Duration::from_millis(200);

struct Args {
    root: PathBuf,
    depth: i32,
    search: Option<String>,
    watch: bool,
    json: bool,
    verbose: bool,
}

fn usage() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        "usage: zcode-tree <path> [--depth N] [--search Q] [--watch] [--json] [--verbose]",
    )
}

fn parse_args() -> io::Result<Args> {
    let mut root = None;
    let mut depth = DEFAULT_DEPTH;
    let mut search = None;
    let mut watch = false;
    let mut json = false;
    let mut verbose = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--depth" => {
                depth = args
                    .next()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(usage)?;
            }
            "--search" => search = Some(args.next().ok_or_else(usage)?),
            "--watch" => watch = true,
            "--json" => json = true,
            "--verbose" | "-v" => verbose = true,
            _ if root.is_none() && !arg.starts_with("--") => root = Some(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }

    Ok(Args {
        root: root.ok_or_else(usage)?,
        depth,
        search,
        watch,
        json,
        verbose,
    })
}

fn render(tree: &mut WorkspaceTree, depth: i32, out: &mut impl Write) -> io::Result<()> {
    let icons = PlainIconTable;
    let rows = tree.flatten_descendants(tree.root(), depth, false);
    let base = tree.depth_of(tree.root());
    for id in rows {
        let Some(icon) = tree.render_icon(id, "") else {
            continue;
        };
        let indent = (tree.depth_of(id) - base) * 2;
        writeln!(
            out,
            "{:indent$}{} {} {}",
            "",
            icons.symbol(icon),
            tree.file_name(id).unwrap_or_default(),
            tree.change_tag_label(id),
            indent = indent
        )?;
    }
    Ok(())
}

fn print_search(tree: &WorkspaceTree, query: &str, out: &mut impl Write) -> io::Result<()> {
    let root = tree.root();
    let count = tree.count_matches(root, query, MatchOptions::default());
    writeln!(out, "{} match(es) for {:?}", count, query)?;
    let matches: Vec<NodeId> = tree.matching_children(root, query, MatchOptions::default());
    for id in matches {
        let kind = if tree.is_folder(id) { "dir " } else { "file" };
        writeln!(out, "  {} {}", kind, tree.identity(id).unwrap_or_default())?;
    }
    Ok(())
}

fn main() -> io::Result<()> {
    let args = parse_args()?;
    let logging = logging::init(args.verbose);
    if let (true, Some(guard)) = (args.verbose, &logging) {
        eprintln!("logs: {}", guard.log_dir().display());
    }

    if let Err(e) = ensure_config_file() {
        tracing::warn!(error = %e, "could not create default tree config");
    }
    let config = load_config();
    let enumerator = LocalEnumerator::from_config(&config);
    let mut tree = WorkspaceTree::open(&args.root, config, &enumerator, &NoChangeTags);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.json {
        if let Some(snapshot) = tree.snapshot(tree.root()) {
            let text = serde_json::to_string_pretty(&snapshot)
                .map_err(io::Error::other)?;
            writeln!(out, "{}", text)?;
        }
        return Ok(());
    }

    if let Some(query) = &args.search {
        return print_search(&tree, query, &mut out);
    }

    render(&mut tree, args.depth, &mut out)?;
    if !args.watch {
        return Ok(());
    }

    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&stop))?;

    tracing::info!(watched = tree.watched_count(), "watching workspace");
    while !stop.load(Ordering::Relaxed) {
        let refreshed = tree.wait_and_process(WATCH_TICK, &enumerator, &NoChangeTags);
        if refreshed.is_empty() {
            continue;
        }
        writeln!(out, "---")?;
        render(&mut tree, args.depth, &mut out)?;
        out.flush()?;
    }
    tracing::info!("watch stopped");
    Ok(())
}
