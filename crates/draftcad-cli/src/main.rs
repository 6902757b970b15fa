//! `draftcad`: headless host for DraftCAD drafts.
//!
//! Creates drafts, replays scripted tool input into them and inspects the
//! result through the same render list a graphical shell would consume.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use draftcad_core::storage::{self, FileStorage};
use draftcad_core::{
    Canvas, EditorConfig, FillRef, FontRef, InputEvent, Key, Scene, Storage, StrokeRef,
    StyleLibrary, ToolKind, render_list,
};
use kurbo::Point;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "draftcad", version, about = "Headless DraftCAD draft tool")]
struct Cli {
    /// Editor configuration file (JSON).
    #[arg(long, global = true, env = "DRAFTCAD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an empty draft.
    New {
        path: PathBuf,
        /// Number of layers to create.
        #[arg(long, default_value_t = 1)]
        layers: usize,
        #[arg(long, default_value = "Untitled")]
        name: String,
    },
    /// Draw a sample part by replaying pointer input through the tools.
    Demo { path: PathBuf },
    /// Print the layers and shapes of a draft.
    Inspect { path: PathBuf },
    /// Report the topmost shape at a world position.
    Hit {
        path: PathBuf,
        x: f64,
        y: f64,
        /// Pick tolerance in world units (defaults to the configured pixel tolerance).
        #[arg(long)]
        tolerance: Option<f64>,
    },
    /// List drafts in a storage directory.
    List {
        /// Directory to list (defaults to the platform data directory).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Command::New { path, layers, name } => new_draft(&path, layers, name, &config),
        Command::Demo { path } => demo(&path, config),
        Command::Inspect { path } => inspect(&path),
        Command::Hit {
            path,
            x,
            y,
            tolerance,
        } => hit(&path, Point::new(x, y), tolerance, &config),
        Command::List { dir } => list(dir),
    }
}

fn load(path: &Path) -> Result<Scene> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    storage::deserialize(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn save(path: &Path, scene: &Scene) -> Result<()> {
    let bytes = storage::serialize(scene)?;
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

fn new_draft(path: &Path, layers: usize, name: String, config: &EditorConfig) -> Result<()> {
    if layers == 0 {
        bail!("a draft needs at least one layer");
    }
    let mut scene = Scene::from_config(config);
    scene.name = name;
    for n in 2..=layers {
        scene.add_layer(format!("Layer {n}"));
    }
    save(path, &scene)?;
    println!("{} ({} layer(s))", path.display(), scene.layers().len());
    Ok(())
}

fn drag(canvas: &mut Canvas, lib: &StyleLibrary, from: (f64, f64), to: (f64, f64)) {
    canvas.handle_input(InputEvent::down(from.0, from.1), lib);
    canvas.handle_input(InputEvent::moved(to.0, to.1), lib);
    canvas.handle_input(InputEvent::up(to.0, to.1), lib);
}

fn click(canvas: &mut Canvas, lib: &StyleLibrary, at: (f64, f64)) {
    canvas.handle_input(InputEvent::down(at.0, at.1), lib);
    canvas.handle_input(InputEvent::up(at.0, at.1), lib);
}

fn demo(path: &Path, config: EditorConfig) -> Result<()> {
    let lib = StyleLibrary::with_defaults();
    let mut canvas = Canvas::new(config);
    canvas.scene.name = "Mounting plate".to_string();

    let outline = canvas.scene.active_layer_id();
    {
        let layer = canvas.scene.layer_mut(outline)?;
        layer.rename("Outline");
        layer.default_stroke = Some(StrokeRef::new("pen.default"));
        layer.default_fill = Some(FillRef::new("brush.white"));
    }

    canvas.set_tool(ToolKind::Rectangle);
    drag(&mut canvas, &lib, (0.0, 0.0), (300.0, 180.0));

    canvas.set_tool(ToolKind::Ellipse);
    drag(&mut canvas, &lib, (40.0, 40.0), (80.0, 80.0));
    drag(&mut canvas, &lib, (220.0, 40.0), (260.0, 80.0));

    canvas.set_tool(ToolKind::Polyline);
    for at in [(100.0, 120.0), (200.0, 120.0), (200.0, 160.0), (100.0, 160.0)] {
        click(&mut canvas, &lib, at);
    }
    canvas.handle_input(InputEvent::key(Key::Enter), &lib);

    let centre = canvas.scene.add_layer("Centerlines");
    canvas.scene.set_active_layer(centre)?;
    canvas.scene.layer_mut(centre)?.default_stroke = Some(StrokeRef::new("pen.center"));

    canvas.set_tool(ToolKind::Line);
    drag(&mut canvas, &lib, (-20.0, 90.0), (320.0, 90.0));
    drag(&mut canvas, &lib, (150.0, -20.0), (150.0, 200.0));

    canvas.set_tool(ToolKind::Arc);
    drag(&mut canvas, &lib, (150.0, 90.0), (150.0, 30.0));

    let notes = canvas.scene.add_layer("Notes");
    canvas.scene.set_active_layer(notes)?;
    canvas.tools.current_font = Some(FontRef::new("font.default"));
    canvas.config.text_content = "PLATE 300x180".to_string();
    canvas.set_tool(ToolKind::Text);
    click(&mut canvas, &lib, (0.0, 200.0));

    canvas.set_tool(ToolKind::Select);
    canvas.fit_to_content();

    log::info!(
        "Demo drew {} shape(s) on {} layer(s)",
        canvas.scene.shape_count(),
        canvas.scene.layers().len()
    );
    canvas.scene.validate()?;
    save(path, &canvas.scene)?;
    println!("{} ({} shapes)", path.display(), canvas.scene.shape_count());
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let scene = load(path)?;
    let lib = StyleLibrary::with_defaults();
    println!("{} [{}]", scene.name, scene.id);
    let active = scene.active_layer_id();
    for layer in scene.layers() {
        let marker = if layer.id() == active { "*" } else { " " };
        let flags = match (layer.visible, layer.locked) {
            (true, false) => "",
            (true, true) => " (locked)",
            (false, false) => " (hidden)",
            (false, true) => " (hidden, locked)",
        };
        println!("{marker} {}{flags}: {} shape(s)", layer.name, layer.len());
    }

    for render_layer in render_list(&scene, &lib) {
        println!("\n{}", render_layer.name);
        for item in &render_layer.items {
            let bounds = item
                .bounds
                .map(|b| format!("({:.1}, {:.1})-({:.1}, {:.1})", b.x0, b.y0, b.x1, b.y1))
                .unwrap_or_else(|| "empty".to_string());
            let width = item.stroke.as_ref().map_or(0.0, |s| s.width);
            println!(
                "  {} {:?} {bounds} stroke={width}",
                item.shape_id,
                item.primitive.kind()
            );
            for err in &item.unresolved {
                println!("    fallback: {err}");
            }
        }
    }
    Ok(())
}

fn hit(path: &Path, point: Point, tolerance: Option<f64>, config: &EditorConfig) -> Result<()> {
    let scene = load(path)?;
    let tolerance =
        tolerance.unwrap_or_else(|| scene.camera.world_tolerance(config.hit_tolerance_px));
    match scene.hit_test_topmost(point, tolerance) {
        Some(id) => {
            let shape = scene.shape(id)?;
            let layer = scene.layer(shape.layer())?;
            println!("{id} {:?} on '{}'", shape.primitive.kind(), layer.name);
        }
        None => println!("no shape at ({}, {})", point.x, point.y),
    }
    Ok(())
}

fn list(dir: Option<PathBuf>) -> Result<()> {
    let storage = match dir {
        Some(dir) => FileStorage::new(dir)?,
        None => FileStorage::default_location()?,
    };
    for id in storage.list()? {
        println!("{id}");
    }
    Ok(())
}
