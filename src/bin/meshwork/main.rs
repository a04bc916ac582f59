//! Meshwork CLI - mesh editing and operator assembly from the command line.
//!
//! Usage: meshwork <COMMAND> [OPTIONS]
//!
//! Every command works on either a JSON mesh snapshot (`--input`) or a
//! generated grid (`--nx`, `--ny`, `--spacing`). Set `RUST_LOG=debug` to see
//! the edits as they happen.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};

use meshwork::algo::{split, traversal};
use meshwork::matrix::{self, DegenerateHandling, Matrix, MatrixFormat, OperatorOptions};
use meshwork::mesh::{primitives, FaceKey, HalfEdgeMesh, VertexKey};

#[derive(Parser)]
#[command(name = "meshwork")]
#[command(author, version, about = "Half-edge mesh editing CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Input mesh snapshot (JSON); a grid is generated when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Grid cells along X
    #[arg(long, default_value = "4")]
    nx: usize,

    /// Grid cells along Y
    #[arg(long, default_value = "4")]
    ny: usize,

    /// Grid spacing
    #[arg(long, default_value = "1.0")]
    spacing: f64,

    /// Generate a triangulated grid instead of quads
    #[arg(long)]
    triangles: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        #[command(flatten)]
        source: Source,
    },

    /// List connected components
    Components {
        #[command(flatten)]
        source: Source,
    },

    /// Assemble an operator matrix and summarize it
    Operators {
        #[command(flatten)]
        source: Source,

        /// Operator to assemble
        #[arg(short, long, value_enum, default_value = "laplacian")]
        operator: Operator,

        /// Storage format
        #[arg(short, long, value_enum, default_value = "csr")]
        format: Format,

        /// Use a zero weight for degenerate triangles instead of failing
        #[arg(long)]
        zero_degenerate: bool,

        /// Build the combinatorial Laplacian (degree on the diagonal) instead of the normalized one
        #[arg(long)]
        combinatorial: bool,

        /// Print the matrix in dense form
        #[arg(long)]
        print: bool,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Split an edge or a face and write the resulting snapshot
    Split {
        #[command(flatten)]
        source: Source,

        /// Kind of split
        #[arg(short, long, value_enum, default_value = "edge")]
        method: SplitMethod,

        /// First vertex key
        #[arg(short)]
        u: usize,

        /// Second vertex key
        #[arg(short)]
        v: usize,

        /// Face key (face splits only)
        #[arg(long)]
        face: Option<usize>,

        /// Split parameter along the edge
        #[arg(short, default_value = "0.5")]
        t: f64,

        /// Split boundary edges too
        #[arg(long)]
        allow_boundary: bool,

        /// Output snapshot (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Operator {
    /// Vertex adjacency
    Adjacency,
    /// Vertex degrees
    Degree,
    /// Edge-vertex incidence
    Connectivity,
    /// Uniform-weight Laplacian
    Laplacian,
    /// Face-vertex incidence
    Face,
    /// Cotangent Laplacian (triangle meshes)
    Cotangent,
    /// Gradient (triangle meshes)
    Grad,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Dense array
    Dense,
    /// Compressed sparse row
    Csr,
    /// Compressed sparse column
    Csc,
    /// Coordinate list
    Coo,
}

impl From<Format> for MatrixFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Dense => MatrixFormat::Dense,
            Format::Csr => MatrixFormat::Csr,
            Format::Csc => MatrixFormat::Csc,
            Format::Coo => MatrixFormat::Coo,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SplitMethod {
    /// Insert a vertex into the adjacent face loops
    Edge,
    /// Insert a vertex and retriangulate the adjacent triangles
    TriEdge,
    /// Cut a face along a new edge
    Face,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { source } => cmd_info(&source)?,

        Commands::Components { source } => cmd_components(&source)?,

        Commands::Operators {
            source,
            operator,
            format,
            zero_degenerate,
            combinatorial,
            print,
            sequential,
        } => {
            let degenerate = if zero_degenerate {
                DegenerateHandling::Zero
            } else {
                DegenerateHandling::Error
            };
            let options = OperatorOptions::default()
                .with_format(format.into())
                .with_degenerate(degenerate)
                .with_normalize(!combinatorial)
                .with_parallel(!sequential);
            cmd_operators(&source, operator, &options, print)?;
        }

        Commands::Split {
            source,
            method,
            u,
            v,
            face,
            t,
            allow_boundary,
            output,
        } => {
            cmd_split(&source, method, (u, v), face, t, allow_boundary, output.as_deref())?;
        }
    }

    Ok(())
}

fn load(source: &Source) -> Result<HalfEdgeMesh, Box<dyn std::error::Error>> {
    let mesh = match &source.input {
        Some(path) => {
            log::info!("Loading mesh from: {}", path.display());
            HalfEdgeMesh::from_json(&fs::read_to_string(path)?)?
        }
        None if source.triangles => {
            primitives::triangulated_grid(source.nx, source.ny, source.spacing)?
        }
        None => primitives::grid(source.nx, source.ny, source.spacing)?,
    };
    log::info!(
        "Mesh: {} vertices, {} faces",
        mesh.num_vertices(),
        mesh.num_faces()
    );
    Ok(mesh)
}

fn cmd_info(source: &Source) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load(source)?;

    if let Some(path) = &source.input {
        println!("File: {}", path.display());
    }
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Edges: {}", mesh.num_edges());
    println!("Half-edges: {}", mesh.num_halfedges());

    let mut total_area = 0.0;
    for f in mesh.face_keys() {
        total_area += mesh.face_area(f)?;
    }
    println!("Surface area: {:.6}", total_area);

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    if mesh.is_triangle_mesh() {
        println!("Mesh type: Triangle mesh");
    } else {
        println!("Mesh type: Polygon mesh");
    }

    let boundary = mesh.vertices_on_boundary();
    if boundary.is_empty() {
        println!("Topology: Closed (no boundary)");
    } else {
        println!(
            "Topology: Open ({} boundary vertices, {} boundary edges)",
            boundary.len(),
            mesh.edges_on_boundary().len()
        );
    }
    println!("Components: {}", traversal::connected_components(&mesh).len());
    println!("Valid: {}", mesh.is_valid());

    Ok(())
}

fn cmd_components(source: &Source) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load(source)?;
    let components = traversal::connected_components(&mesh);

    println!("{} component(s)", components.len());
    for (i, component) in components.iter().enumerate() {
        let keys: Vec<String> = component.iter().map(|v| v.to_string()).collect();
        println!("  [{}] {} vertices: {}", i, component.len(), keys.join(" "));
    }
    Ok(())
}

fn cmd_operators(
    source: &Source,
    operator: Operator,
    options: &OperatorOptions,
    print: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load(source)?;

    let start = Instant::now();
    let m: Matrix = match operator {
        Operator::Adjacency => matrix::mesh_adjacency_matrix(&mesh, options)?,
        Operator::Degree => matrix::mesh_degree_matrix(&mesh, options)?,
        Operator::Connectivity => matrix::mesh_connectivity_matrix(&mesh, options)?,
        Operator::Laplacian => matrix::mesh_laplacian_matrix(&mesh, options)?,
        Operator::Face => matrix::mesh_face_matrix(&mesh, options)?,
        Operator::Cotangent => matrix::trimesh_cotangent_laplacian_matrix(&mesh, options)?,
        Operator::Grad => matrix::trimesh_gradient_matrix(&mesh, options)?,
    };
    let elapsed = start.elapsed();

    let dense = m.to_dense();
    let nonzeros = dense.iter().filter(|x| **x != 0.0).count();
    let max_row_sum = m.row_sums().iter().fold(0.0_f64, |acc, s| acc.max(s.abs()));

    println!("Format: {:?}", m.format());
    println!("Shape: {} x {}", m.nrows(), m.ncols());
    println!("Non-zeros: {}", nonzeros);
    println!("Max |row sum|: {:.3e}", max_row_sum);
    println!("Assembled in {:.2?}", elapsed);
    if print {
        println!("{}", dense);
    }
    Ok(())
}

fn cmd_split(
    source: &Source,
    method: SplitMethod,
    (u, v): (usize, usize),
    face: Option<usize>,
    t: f64,
    allow_boundary: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = load(source)?;
    let u = VertexKey::try_new(u).ok_or("vertex key out of range")?;
    let v = VertexKey::try_new(v).ok_or("vertex key out of range")?;

    match method {
        SplitMethod::Edge | SplitMethod::TriEdge => {
            let result = if method == SplitMethod::Edge {
                split::split_edge(&mut mesh, u, v, t, allow_boundary)?
            } else {
                split::trimesh_split_edge(&mut mesh, u, v, t, allow_boundary)?
            };
            match result {
                Some(w) => eprintln!("Inserted vertex {}", w),
                None => eprintln!("Edge ({}, {}) is on the boundary; skipped", u, v),
            }
        }
        SplitMethod::Face => {
            let face = face.ok_or("--face is required for face splits")?;
            let f = FaceKey::try_new(face).ok_or("face key out of range")?;
            let (a, b) = split::split_face(&mut mesh, f, u, v)?;
            eprintln!("Replaced face {} with faces {} and {}", f, a, b);
        }
    }

    let json = serde_json::to_string_pretty(&mesh.to_data())?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            eprintln!("Saved: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
