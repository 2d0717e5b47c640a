//! CLI command implementations for churnboard.
//!
//! Provides subcommand handlers for:
//! - `churnboard show`: one refresh for a filter combination, then print
//! - `churnboard interactive`: filter prompt driving repeated refreshes
//! - `churnboard filters`: list the legal filter values
//! - `churnboard health`: check config files, backend and refresh log
//! - `churnboard history`: aggregate the refresh log
//! - `churnboard config show|init|set|reset`: configuration management

pub mod render;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::analytics::{logger, reporter};
use crate::api::{BackendClient, MetricSource};
use crate::config::{
    self,
    schema::{DashboardConfig, LoggingConfig, OutputFormat},
};
use crate::controls::{ControlCommand, ControlOutcome, FilterControls, HELP};
use crate::dashboard::{Dashboard, RefreshReport};
use crate::filters::{Dimension, FilterOptions, FilterSnapshot};
use crate::widgets::{TextCanvas, WidgetRegistry};

/// Filter values requested on the command line; `None` keeps the default.
#[derive(Debug, Clone, Default)]
pub struct FilterArgs {
    pub segment: Option<String>,
    pub service: Option<String>,
    pub contract: Option<String>,
}

impl FilterArgs {
    fn selections(&self) -> impl Iterator<Item = (Dimension, &str)> {
        [
            (Dimension::Segment, self.segment.as_deref()),
            (Dimension::Service, self.service.as_deref()),
            (Dimension::Contract, self.contract.as_deref()),
        ]
        .into_iter()
        .filter_map(|(d, v)| v.map(|v| (d, v)))
    }
}

/// Resolve `--format`, falling back to the configured default.
pub fn resolve_format(flag: Option<&str>, config: &DashboardConfig) -> OutputFormat {
    match flag {
        Some(_) => OutputFormat::from_str_opt(flag),
        None => config.display.format,
    }
}

fn text_dashboard<S: MetricSource>(
    source: S,
    config: &DashboardConfig,
) -> Dashboard<S, TextCanvas> {
    let bar_width = config.display.bar_width;
    Dashboard::new(
        source,
        WidgetRegistry::standard_with(|_| TextCanvas::with_bar_width(bar_width)),
    )
}

fn load_options(client: &BackendClient) -> Result<FilterOptions> {
    client
        .fetch_filters()
        .with_context(|| format!("failed to load filter options from {}", client.base_url()))
}

// ---------------------------------------------------------------------------
// churnboard show
// ---------------------------------------------------------------------------

/// Refresh once for the requested filters and print the dashboard.
///
/// Fails (non-zero exit) when any dataset could not be refreshed, after the
/// partial dashboard has been printed.
pub fn run_show(
    config: &DashboardConfig,
    filters: &FilterArgs,
    format: OutputFormat,
) -> Result<()> {
    let client = BackendClient::from_config(&config.backend);
    let mut controls = FilterControls::new(load_options(&client)?);
    controls.initial_load();
    for (dimension, value) in filters.selections() {
        controls.handle(ControlCommand::Select {
            dimension,
            value: value.to_string(),
        })?;
    }

    let snapshot = controls.state().current();
    let mut dashboard = text_dashboard(client, config);
    let report = dashboard.refresh(&snapshot);
    logger::log_refresh(&config.logging, &report);

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&render::dashboard_json(&dashboard, &report))?
        ),
        OutputFormat::Table => println!("{}", render::dashboard_text(&dashboard, &report)),
    }

    report.into_result()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// churnboard interactive
// ---------------------------------------------------------------------------

/// Load filter options, refresh with the defaults, then read commands from
/// stdin until `quit` or end of input.
pub fn run_interactive(config: &DashboardConfig) -> Result<()> {
    let client = BackendClient::from_config(&config.backend);
    let mut controls = FilterControls::new(load_options(&client)?);
    let mut dashboard = text_dashboard(client, config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    interactive_session(
        &mut dashboard,
        &mut controls,
        &config.logging,
        stdin.lock(),
        &mut stdout,
    )?;
    Ok(())
}

/// Drive a dashboard from a line-oriented command stream.
///
/// Runs the initial load, then one refresh per `apply` or `reset`. Bad
/// commands and rejected selections are reported and the loop continues.
/// Returns the number of refreshes performed.
pub fn interactive_session<S, R, W>(
    dashboard: &mut Dashboard<S, TextCanvas>,
    controls: &mut FilterControls,
    logging: &LoggingConfig,
    input: R,
    out: &mut W,
) -> Result<u64>
where
    S: MetricSource,
    R: BufRead,
    W: Write,
{
    controls.initial_load();
    let mut last_report = refresh_and_print(dashboard, &controls.state().current(), logging, out)?;
    writeln!(out, "{}", "Type `help` for commands.".dimmed())?;

    let mut lines = input.lines();
    loop {
        write!(out, "{} ", "churnboard>".bold())?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match ControlCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{} {}", "✗".red().bold(), e)?;
                continue;
            }
        };

        match controls.handle(command) {
            Ok(ControlOutcome::Refresh(snapshot)) => {
                last_report = refresh_and_print(dashboard, &snapshot, logging, out)?;
            }
            Ok(ControlOutcome::Selected { dimension, value }) => {
                writeln!(
                    out,
                    "{} {} = {} {}",
                    "✓".green().bold(),
                    dimension,
                    value,
                    "(type `apply` to refresh)".dimmed()
                )?;
            }
            Ok(ControlOutcome::Redisplay) => {
                writeln!(out, "{}", render::dashboard_text(dashboard, &last_report))?;
            }
            Ok(ControlOutcome::ListFilters) => {
                let state = controls.state();
                writeln!(
                    out,
                    "{}",
                    render::filters_text(state.options(), &state.current())
                )?;
            }
            Ok(ControlOutcome::Help) => writeln!(out, "{HELP}")?,
            Ok(ControlOutcome::Quit) => break,
            Err(e) => writeln!(out, "{} {}", "✗".red().bold(), e)?,
        }
    }

    Ok(dashboard.refresh_count())
}

fn refresh_and_print<S: MetricSource, W: Write>(
    dashboard: &mut Dashboard<S, TextCanvas>,
    snapshot: &FilterSnapshot,
    logging: &LoggingConfig,
    out: &mut W,
) -> Result<RefreshReport> {
    let report = dashboard.refresh(snapshot);
    logger::log_refresh(logging, &report);
    writeln!(out, "{}", render::dashboard_text(dashboard, &report))?;
    Ok(report)
}

// ---------------------------------------------------------------------------
// churnboard filters
// ---------------------------------------------------------------------------

/// List the filter values the backend accepts.
pub fn run_filters(config: &DashboardConfig, format: OutputFormat) -> Result<()> {
    let client = BackendClient::from_config(&config.backend);
    let options = load_options(&client)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&options)?),
        OutputFormat::Table => {
            let current = options.default_snapshot();
            println!("{}", render::filters_text(&options, &current));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// churnboard health
// ---------------------------------------------------------------------------

/// Check config files, backend reachability and the refresh log.
pub fn run_health(config: &DashboardConfig) -> Result<()> {
    println!("{}", "Churnboard Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.churnboard/config.toml found"
        } else {
            "not found (run `churnboard config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".churnboard.toml found"
        } else {
            "not found (optional)"
        },
    );

    let client = BackendClient::from_config(&config.backend);
    let timeout = match client.timeout() {
        Some(t) => format!("{} ms timeout", t.as_millis()),
        None => format!(
            "no request timeout, {} s connect limit",
            client.connect_timeout().as_secs()
        ),
    };
    print_health_item(
        "Backend URL",
        true,
        &format!("{} ({timeout})", client.base_url()),
    );

    let ping = client.ping();
    match &ping {
        Ok(message) => print_health_item("Backend ping", true, message),
        Err(e) => print_health_item("Backend ping", false, &e.to_string()),
    }

    let mut backend_ok = ping.is_ok();
    match client.fetch_filters() {
        Ok(options) => {
            let detail = Dimension::ALL
                .iter()
                .map(|d| format!("{} {}", options.values(*d).len(), d))
                .collect::<Vec<_>>()
                .join(", ");
            print_health_item("Filter options", true, &detail);
        }
        Err(e) => {
            backend_ok = false;
            print_health_item("Filter options", false, &e.to_string());
        }
    }

    if config.logging.enabled {
        let entries = logger::read_configured_entries(&config.logging);
        let path = logger::refresh_log_path(&config.logging)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| config.logging.path.clone());
        print_health_item(
            "Refresh log",
            true,
            &format!("{} entries in {path}", entries.len()),
        );
    } else {
        print_health_item("Refresh log", true, "disabled");
    }

    println!();
    if backend_ok {
        println!("{}", "All checks passed.".green());
    } else {
        println!(
            "{}",
            "Backend is not reachable. Check [backend] url or CHURNBOARD_BACKEND_URL.".yellow()
        );
    }
    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<20} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// churnboard history
// ---------------------------------------------------------------------------

/// Summarise the refresh log.
pub fn run_history(
    config: &DashboardConfig,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let entries = logger::read_configured_entries(&config.logging);
    let history = reporter::build_history(&entries, limit);

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&render::history_json(&history))?
        ),
        OutputFormat::Table => {
            if history.total_refreshes == 0 {
                println!(
                    "{}",
                    "No refreshes logged yet. Run `churnboard show` to record one.".yellow()
                );
            } else {
                println!("{}", render::history_text(&history));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// churnboard config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective Churnboard Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for (path, label) in [
        (config::global_config_file(), "~/.churnboard/config.toml"),
        (config::project_config_file(), ".churnboard.toml"),
    ] {
        if path.is_some_and(|p| p.exists()) {
            println!("  {} {}", "✓".green(), label.dimmed());
        } else {
            println!("  {} {}", "·".dimmed(), format!("{label} (not found)").dimmed());
        }
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "CHURNBOARD_* environment variables".dimmed()
    );
    Ok(())
}

/// Write a default config file to `~/.churnboard/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} Config written to {}", "✓".green().bold(), path.display());
    Ok(())
}

/// Set a single value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Overwrite the global config file with defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

