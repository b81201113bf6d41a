mod assembly;
mod initialize;
mod io;
mod mesh;
