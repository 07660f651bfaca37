use anyhow::{bail, Context, Result};
use clap::Parser;

use dockyard::dump::LayoutDump;
use dockyard::saver::{FileSettings, SettingsStore, LAYOUT_GROUP, LAYOUT_KEY};
use dockyard::{
    ApplicationIdentity, DockConfig, DockLocation, DockRegistry, DockTarget, LayoutSaver, Rect,
    Size,
};

mod cli;

use cli::{CliArgs, Command};

fn main() -> Result<()> {
    let args = CliArgs::parse();
    dockyard::logging::init(args.log_file);

    let mut config = DockConfig::load();
    if !config.identity.is_complete() {
        tracing::debug!("No application identity configured, using the demo store");
        config.identity = ApplicationIdentity::new("dockyard", "demo");
    }
    match args.command {
        Command::Demo { backend, output } => {
            let mut config = config;
            if let Some(backend) = backend {
                config.backend = backend;
            }
            demo(config, output)
        }
        Command::Inspect { path } => inspect(&config, path),
    }
}

/// Sample arrangement: an IDE-like main window, a tool window floating over
/// it, a bare floating panel and one closed panel
fn build_demo(config: DockConfig) -> Result<DockRegistry> {
    let mut registry = DockRegistry::new(config);
    let main = registry.create_main_window("main")?;

    for (name, title) in [
        ("files", "Files"),
        ("editor", "Editor"),
        ("outline", "Outline"),
        ("console", "Console"),
        ("search", "Search"),
        ("notes", "Notes"),
        ("terminal", "Terminal"),
    ] {
        registry.register_panel(name, title)?;
    }
    registry.set_panel_minimum_size("files", Size::new(180, 200))?;

    registry.dock_panel("editor", DockTarget::main(main, DockLocation::Left))?;
    registry.dock_panel("files", DockTarget::main(main, DockLocation::Left))?;
    registry.dock_panel("console", DockTarget::main(main, DockLocation::Bottom))?;
    registry.dock_panel(
        "outline",
        DockTarget::main(main, DockLocation::Tab).relative_to("files"),
    )?;
    registry.float_panel_in_window("search", Rect::new(200, 150, 320, 400), Some(main))?;
    registry.float_panel("notes", Rect::new(900, 80, 300, 240))?;
    registry.dock_panel(
        "terminal",
        DockTarget::main(main, DockLocation::Tab).relative_to("console"),
    )?;
    registry.close_panel("terminal")?;

    Ok(registry)
}

fn demo(config: DockConfig, output: Option<std::path::PathBuf>) -> Result<()> {
    let mut registry = build_demo(config.clone())?;
    let data = LayoutSaver::new(&mut registry).try_serialize_layout()?;

    match &output {
        Some(path) => {
            std::fs::write(path, &data)
                .with_context(|| format!("Failed to write layout to {}", path.display()))?;
            println!("Wrote {} bytes to {}", data.len(), path.display());
        }
        None => {
            LayoutSaver::new(&mut registry).try_save_to_disk()?;
            println!("Saved {} bytes to the settings store", data.len());
        }
    }

    // Restore into a fresh registry that only knows the main window; the
    // factory recreates the panels
    let mut restored = DockRegistry::new(config);
    restored.create_main_window("main")?;
    restored.set_panel_factory(|name| Some(name.to_string()));
    LayoutSaver::new(&mut restored).try_restore_layout(&data)?;

    let again = LayoutSaver::new(&mut restored).try_serialize_layout()?;
    if again != data {
        bail!("restored layout does not serialize back to the same bytes");
    }
    println!("Round trip OK");
    print!("{}", LayoutDump::decode(&data)?);
    Ok(())
}

fn inspect(config: &DockConfig, path: Option<std::path::PathBuf>) -> Result<()> {
    let data = match path {
        Some(path) => std::fs::read(&path)
            .with_context(|| format!("Failed to read layout from {}", path.display()))?,
        None => {
            let store = FileSettings::open_default(&config.identity)?;
            store
                .value(LAYOUT_GROUP, LAYOUT_KEY)
                .with_context(|| format!("No saved layout in {}", store.path().display()))?
        }
    };
    print!("{}", LayoutDump::decode(&data)?);
    Ok(())
}
