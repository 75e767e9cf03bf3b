//! meshsect CLI - cut triangle meshes with a plane.
//!
//! Reads STL or JSON meshes and prints or writes the planar section as
//! loops of lines and arcs.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use meshsect::{
    plane_transform, section_mesh, AffineTransform, Point3, SectionCurve, SectionLoop, SectionPoint,
    SectionSettings, TriangleMesh, Vec3,
};

mod mesh_io;

#[derive(Parser)]
#[command(name = "meshsect")]
#[command(about = "Planar cross-sections of triangle meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cut a mesh with a plane
    Section(SectionArgs),
    /// Display vertex and triangle counts and bounds of a mesh
    Info {
        /// Mesh file (.stl or .json)
        mesh: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SectionArgs {
    /// Mesh file (.stl or .json)
    mesh: PathBuf,

    /// Point on the cutting plane, as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    origin: Option<Vec3>,

    /// Plane normal, as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    normal: Option<Vec3>,

    /// Direction of the plane's local X axis, as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    x_dir: Option<Vec3>,

    /// Full plane-to-world matrix: 16 comma-separated values, row-major
    #[arg(
        long,
        value_parser = parse_transform,
        allow_hyphen_values = true,
        conflicts_with_all = ["origin", "normal", "x_dir"]
    )]
    transform: Option<AffineTransform>,

    /// TOML file with section settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit raw segments instead of stitched loops
    #[arg(long)]
    no_connect: bool,

    /// Keep collinear points
    #[arg(long)]
    no_lines: bool,

    /// Fit arcs through runs of points on a circle
    #[arg(long)]
    arcs: bool,

    /// Fewest points a run needs to become an arc
    #[arg(long)]
    min_arc_points: Option<usize>,

    /// Write loops and curves as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Section(args) => run_section(&args)?,
        Commands::Info { mesh } => show_info(&mesh)?,
    }

    Ok(())
}

/// Parse `x,y,z`.
fn parse_vec3(s: &str) -> std::result::Result<Vec3, String> {
    let values = parse_floats(s)?;
    match values.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected 3 comma-separated values, got {}", values.len())),
    }
}

/// Parse 16 row-major matrix entries.
fn parse_transform(s: &str) -> std::result::Result<AffineTransform, String> {
    let values: [f64; 16] = parse_floats(s)?
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected 16 comma-separated values, got {}", v.len()))?;
    Ok(AffineTransform::from_array(values))
}

fn parse_floats(s: &str) -> std::result::Result<Vec<f64>, String> {
    s.split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<f64>()
                .map_err(|_| format!("invalid number {part:?}"))
        })
        .collect()
}

/// Settings from the config file (or defaults), then command-line overrides.
fn load_settings(args: &SectionArgs) -> Result<SectionSettings> {
    let mut settings = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SectionSettings::default(),
    };

    if args.no_connect {
        settings.connect_loops = false;
    }
    if args.no_lines {
        settings.simplify_lines = false;
    }
    if args.arcs {
        settings.simplify_arcs = true;
    }
    if let Some(n) = args.min_arc_points {
        settings.min_arc_points = n;
    }

    settings.validate()?;
    Ok(settings)
}

fn plane_from_args(args: &SectionArgs) -> Result<AffineTransform> {
    if let Some(t) = &args.transform {
        return Ok(t.clone());
    }
    let origin = Point3::from(args.origin.unwrap_or_else(Vec3::zeros));
    let normal = args.normal.unwrap_or_else(Vec3::z);
    plane_transform(origin, normal, args.x_dir).context("plane normal must be non-zero")
}

/// JSON document written by `section --output`.
#[derive(Serialize)]
struct SectionReport<'a> {
    /// Plane-to-world matrix, row-major.
    plane: [f64; 16],
    settings: &'a SectionSettings,
    loops: Vec<LoopReport<'a>>,
}

#[derive(Serialize)]
struct LoopReport<'a> {
    closed: bool,
    connected: bool,
    points: &'a [SectionPoint],
    curves: Vec<SectionCurve>,
}

impl<'a> LoopReport<'a> {
    fn new(section: &'a SectionLoop) -> Self {
        Self {
            closed: section.closed,
            connected: section.connected,
            points: &section.points,
            curves: section.curves(),
        }
    }
}

fn run_section(args: &SectionArgs) -> Result<()> {
    let settings = load_settings(args)?;
    let plane = plane_from_args(args)?;
    let mesh = mesh_io::read_mesh(&args.mesh)?;

    let loops = section_mesh(&mesh, &plane, &settings)
        .with_context(|| format!("sectioning {}", args.mesh.display()))?;

    if loops.is_empty() {
        println!("Plane does not cross {}", args.mesh.display());
    } else {
        println!("{} loop(s) in {}", loops.len(), args.mesh.display());
    }
    for (i, section) in loops.iter().enumerate() {
        println!("  {}", describe_loop(i + 1, section));
    }

    if let Some(output) = &args.output {
        let report = SectionReport {
            plane: plane.to_array(),
            settings: &settings,
            loops: loops.iter().map(LoopReport::new).collect(),
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(output, json).with_context(|| format!("writing {}", output.display()))?;
        println!("Wrote {}", output.display());
    }

    Ok(())
}

fn describe_loop(number: usize, section: &SectionLoop) -> String {
    let curves = section.curves();
    let arcs = curves
        .iter()
        .filter(|c| matches!(c, SectionCurve::Arc { .. }))
        .count();
    let length: f64 = curves.iter().map(SectionCurve::length).sum();
    let shape = match (section.connected, section.closed) {
        (false, _) => "unconnected",
        (true, true) => "closed",
        (true, false) => "open",
    };
    format!(
        "{}: {}, {} points, {} lines, {} arcs, length {:.4}",
        number,
        shape,
        section.len(),
        curves.len() - arcs,
        arcs,
        length
    )
}

fn show_info(path: &Path) -> Result<()> {
    let mesh: TriangleMesh = mesh_io::read_mesh(path)?;

    println!("Mesh: {}", path.display());
    println!("  Vertices: {}", mesh.num_vertices());
    println!("  Triangles: {}", mesh.num_triangles());
    match mesh.bounds() {
        Some((min, max)) => {
            println!("  Min: {:.4}, {:.4}, {:.4}", min[0], min[1], min[2]);
            println!("  Max: {:.4}, {:.4}, {:.4}", max[0], max[1], max[2]);
        }
        None => println!("  Bounds: empty"),
    }
    if let Err(e) = mesh.validate() {
        println!("  Invalid: {}", e);
    }

    Ok(())
}
