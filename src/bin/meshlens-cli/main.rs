//! meshlens CLI - run the viewer's actions without a window.
//!
//! Usage: meshlens-cli <COMMAND> <INPUT> [OUTPUT]
//!
//! Each action command writes its result as an extra vertex property of an
//! ASCII PLY file. Run `meshlens-cli --help` for available commands.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use meshlens::demo::{Action, Demo, DEFAULT_SOURCE_VERTEX};
use meshlens::io::{self, ply, ply::VertexProperty};
use meshlens::mesh::{boundary_loops, HalfEdgeMesh};
use meshlens::viz::{Quantity, QuantityData};

/// Distance written for vertices the source cannot reach.
const UNREACHED_DISTANCE: f64 = -1.0;

#[derive(Parser, Debug)]
#[command(name = "meshlens-cli")]
#[command(author, version, about = "Headless mesh inspection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Gaussian curvature density, written as `quality`
    Curvature {
        /// Input mesh file
        input: PathBuf,

        /// Output PLY file
        output: PathBuf,
    },

    /// Area-weighted vertex normals, written as `nx ny nz`
    Normals {
        /// Input mesh file
        input: PathBuf,

        /// Output PLY file
        output: PathBuf,
    },

    /// LSCM parameterization, written as `u v`
    Parameterize {
        /// Input mesh file
        input: PathBuf,

        /// Output PLY file
        output: PathBuf,
    },

    /// Exact geodesic distance from a vertex, written as `quality`.
    /// Vertices the source cannot reach get -1.
    Distance {
        /// Input mesh file
        input: PathBuf,

        /// Output PLY file
        output: PathBuf,

        /// Source vertex index
        #[arg(short, long, default_value_t = DEFAULT_SOURCE_VERTEX, allow_negative_numbers = true)]
        source: i64,
    },
}

/// Exit status for a failed argument parse. Help and version are not failures.
fn parse_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = parse_exit_code(&e);
            let _ = e.print();
            std::process::exit(code);
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => cmd_info(&input)?,
        Commands::Curvature { input, output } => {
            cmd_action(&input, &output, Action::Curvature, DEFAULT_SOURCE_VERTEX)?;
        }
        Commands::Normals { input, output } => {
            cmd_action(&input, &output, Action::Normals, DEFAULT_SOURCE_VERTEX)?;
        }
        Commands::Parameterize { input, output } => {
            cmd_action(&input, &output, Action::Parameterization, DEFAULT_SOURCE_VERTEX)?;
        }
        Commands::Distance {
            input,
            output,
            source,
        } => {
            cmd_action(&input, &output, Action::Distance, source)?;
        }
    }
    Ok(())
}

fn cmd_info(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());

    let mut min_area = f64::MAX;
    let mut max_area = 0.0_f64;
    for fid in mesh.face_ids() {
        let area = mesh.face_area(fid);
        min_area = min_area.min(area);
        max_area = max_area.max(area);
    }
    println!("Surface area: {:.6}", mesh.surface_area());
    println!("Face area range: [{:.6}, {:.6}]", min_area, max_area);

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }
    println!("Average edge length: {:.6}", mesh.average_edge_length());

    let loops = boundary_loops(&mesh);
    match loops.iter().map(Vec::len).max() {
        None => println!("Topology: Closed (no boundary)"),
        Some(longest) => println!(
            "Topology: Open ({} boundary loops, longest has {} vertices)",
            loops.len(),
            longest
        ),
    }

    Ok(())
}

fn cmd_action(
    input: &PathBuf,
    output: &PathBuf,
    action: Action,
    source: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut demo = Demo::load(input)?;
    demo.set_source_vertex(source);
    println!(
        "Loaded: {} vertices, {} faces",
        demo.mesh().num_vertices(),
        demo.mesh().num_faces()
    );

    let start = Instant::now();
    demo.run(action)?;
    let elapsed = start.elapsed();

    for message in demo.scene_mut().take_messages() {
        eprintln!("Warning: {}", message);
    }

    let surface = demo
        .surface_mesh()
        .ok_or("the input mesh is no longer registered")?;
    // A fresh demo holds at most the one quantity this action registered
    let Some(quantity) = surface.quantities().iter().find(|q| is_result_of(q, action)) else {
        println!("Nothing to write ({:.2?})", elapsed);
        return Ok(());
    };

    let mut scratch = Vec::new();
    let property = vertex_property(quantity, &mut scratch);
    ply::save_with_quantities(demo.mesh(), &[property], output)?;
    println!("Wrote {}: {} ({:.2?})", quantity.name(), output.display(), elapsed);

    Ok(())
}

/// Whether a quantity has the kind of data an action produces.
fn is_result_of(quantity: &Quantity, action: Action) -> bool {
    matches!(
        (action, quantity.data()),
        (Action::Curvature, QuantityData::Scalar { .. })
            | (Action::Normals, QuantityData::Vector { .. })
            | (Action::Parameterization, QuantityData::Parameterization { .. })
            | (Action::Distance, QuantityData::Distance { .. })
    )
}

/// PLY property for a quantity. Distances are copied into `scratch` with
/// infinite entries replaced, since ASCII PLY readers reject `inf`.
fn vertex_property<'a>(quantity: &'a Quantity, scratch: &'a mut Vec<f64>) -> VertexProperty<'a> {
    match quantity.data() {
        QuantityData::Scalar { values, .. } => VertexProperty::Quality(values),
        QuantityData::Distance { values } => {
            scratch.clear();
            scratch.extend(
                values
                    .iter()
                    .map(|&d| if d.is_finite() { d } else { UNREACHED_DISTANCE }),
            );
            VertexProperty::Quality(scratch)
        }
        QuantityData::Vector { vectors } => VertexProperty::Normal(vectors),
        QuantityData::Parameterization { coords } => VertexProperty::TexCoord(coords.as_slice()),
    }
}
