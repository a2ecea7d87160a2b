use clap::{Parser, Subcommand};
use gridroute_common::db::{parser, writer};
use gridroute_common::geom::coord::Coordinate;
use gridroute_common::util::config::RouterConfig;
use gridroute_common::util::{check, generator, logger};
use gridroute_router::{RouteError, route_all_nets, route_all_nets_parallel};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an input design, route every net, and write the result.
    Route {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        max_attempts: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Run attempts concurrently, trading determinism of which
        /// attempt wins for wall-clock speed.
        #[arg(long)]
        parallel: bool,
    },
    /// Re-parse an input design and its routed output, and verify the
    /// routing invariants against them.
    Check { input: PathBuf, routed: PathBuf },
    /// Emit a random, internally valid input design.
    Generate {
        output: PathBuf,
        #[arg(long, default_value_t = 20)]
        width: u32,
        #[arg(long, default_value_t = 20)]
        height: u32,
        #[arg(long, default_value_t = 1)]
        bend_penalty: u32,
        #[arg(long, default_value_t = 1)]
        via_penalty: u32,
        #[arg(long, default_value_t = 10)]
        nets: usize,
        #[arg(long, default_value_t = 10)]
        obstacles: usize,
        #[arg(long, default_value_t = 4)]
        max_pins_per_net: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Route {
            input,
            output,
            max_attempts,
            seed,
            parallel,
        } => run_route(&args.config, &input, &output, max_attempts, seed, parallel),
        Commands::Check { input, routed } => run_check(&input, &routed),
        Commands::Generate {
            output,
            width,
            height,
            bend_penalty,
            via_penalty,
            nets,
            obstacles,
            max_pins_per_net,
            seed,
        } => run_generate(
            &output,
            width,
            height,
            bend_penalty,
            via_penalty,
            obstacles,
            nets,
            max_pins_per_net,
            seed,
        ),
    }
}

fn load_config(path: &Option<PathBuf>) -> anyhow::Result<RouterConfig> {
    let Some(path) = path else {
        return Ok(RouterConfig::default());
    };
    if !path.exists() {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            path
        );
        return Ok(RouterConfig::default());
    }
    log::info!("Loading configuration from {:?}", path);
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
    toml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Failed to parse config TOML '{}': {}", path.display(), e))
}

fn run_route(
    config_path: &Option<PathBuf>,
    input: &Path,
    output: &Path,
    max_attempts: Option<usize>,
    seed: Option<u64>,
    parallel: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(m) = max_attempts {
        config.max_attempts = m;
    }
    if let Some(s) = seed {
        config.seed = s;
    }
    config.parallel |= parallel;

    let mut design = parser::parse(input)
        .map_err(|e| anyhow::anyhow!("Invalid input in '{}': {}", input.display(), e))?;

    log::info!(
        "Parsed '{}': {}x{} grid, {} obstacles, {} nets",
        input.display(),
        design.width,
        design.height,
        design.obstacles.len(),
        design.nets.len()
    );

    let outcome = if config.parallel {
        route_all_nets_parallel(&design, &config).map(|routed| {
            design = routed;
        })
    } else {
        route_all_nets(&mut design, &config)
    };

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }
    writer::write_to_path(&design, output)
        .map_err(|e| anyhow::anyhow!("Failed to write output '{}': {}", output.display(), e))?;

    match outcome {
        Ok(()) => {
            println!(
                "Routed all {} net(s) successfully. Wrote '{}'.",
                design.nets.len(),
                output.display()
            );
        }
        Err(RouteError::AttemptsExhausted { attempts }) => {
            let routed = design.nets.iter().filter(|n| n.is_routed()).count();
            println!(
                "Routing failed after {} attempt(s): {}/{} nets routed. Wrote partial output to '{}'.",
                attempts,
                routed,
                design.nets.len(),
                output.display()
            );
        }
        Err(e) => {
            println!("Routing failed: {}", e);
        }
    }

    // Per the external interfaces contract: exit 0 on any completion of
    // the routing attempt loop, success or not. Only I/O and parse
    // errors (already handled above via `?`) produce a non-zero exit.
    Ok(())
}

fn run_check(input: &Path, routed: &Path) -> anyhow::Result<()> {
    let mut design = parser::parse(input)
        .map_err(|e| anyhow::anyhow!("Invalid input in '{}': {}", input.display(), e))?;
    let routes = parse_routed_output(routed)?;

    let mut updates = Vec::new();
    for (idx, net) in design.nets.iter().enumerate() {
        if let Some(route) = routes.get(&net.name) {
            let cost = check::route_cost(&design, route);
            updates.push((idx, route.clone(), cost));
        }
    }
    for (idx, route, cost) in updates {
        design.nets[idx].route = route;
        design.nets[idx].cost = Some(cost);
    }

    match check::run(&design) {
        Ok(()) => {
            println!("OK: routing in '{}' is valid.", routed.display());
            Ok(())
        }
        Err(msg) => {
            eprintln!("FAILED: {}", msg);
            std::process::exit(1);
        }
    }
}

/// Parses the output format's `name (l,x,y) (l,x,y) ...` lines back into
/// a per-net cell sequence, for the `check` subcommand's round-trip
/// verification.
fn parse_routed_output(path: &Path) -> anyhow::Result<HashMap<String, Vec<Coordinate>>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read routed output '{}': {}", path.display(), e))?;

    let mut routes = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut tokens = trimmed.split_whitespace();
        let name = tokens
            .next()
            .ok_or_else(|| anyhow::anyhow!("line {}: missing net name", line_no))?;

        let mut route = Vec::new();
        for tok in tokens {
            let inner = tok.trim_start_matches('(').trim_end_matches(')');
            let parts: Vec<&str> = inner.split(',').collect();
            if parts.len() != 3 {
                return Err(anyhow::anyhow!(
                    "line {}: malformed cell '{}'",
                    line_no,
                    tok
                ));
            }
            let layer: u8 = parts[0]
                .parse()
                .map_err(|_| anyhow::anyhow!("line {}: bad layer in '{}'", line_no, tok))?;
            let x: u32 = parts[1]
                .parse()
                .map_err(|_| anyhow::anyhow!("line {}: bad x in '{}'", line_no, tok))?;
            let y: u32 = parts[2]
                .parse()
                .map_err(|_| anyhow::anyhow!("line {}: bad y in '{}'", line_no, tok))?;
            route.push(Coordinate::new(layer, x, y));
        }
        routes.insert(name.to_string(), route);
    }
    Ok(routes)
}

#[allow(clippy::too_many_arguments)]
fn run_generate(
    output: &Path,
    width: u32,
    height: u32,
    bend_penalty: u32,
    via_penalty: u32,
    obstacles: usize,
    nets: usize,
    max_pins_per_net: usize,
    seed: u64,
) -> anyhow::Result<()> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }
    let output_str = output
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("output path is not valid UTF-8"))?;
    generator::generate_random_design(
        output_str,
        width,
        height,
        bend_penalty,
        via_penalty,
        obstacles,
        nets,
        max_pins_per_net,
        seed,
    )?;
    log::info!("Generated: {}", output.display());
    Ok(())
}
