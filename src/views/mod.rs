pub mod ast;
pub mod cfg;
pub mod compose;
pub mod dfg;
