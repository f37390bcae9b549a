#![allow(dead_code)]

pub mod io;
pub mod kdtree;
pub mod mesh;
pub mod ray;
pub mod shape;

pub use io::{load_mesh, MeshIoError};
pub use kdtree::KdTree;
pub use mesh::{Mesh, MeshBuilder, Vertex};
pub use ray::{Ray, RayDifferential};
pub use shape::{DifferentialGeometry, Instance, Shape};
