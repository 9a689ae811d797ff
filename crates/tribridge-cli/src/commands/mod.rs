pub mod locate;
pub mod triangulate;
