pub mod alphabeta;
pub mod aspiration;
pub mod eval;
pub mod history;
pub mod limits;
pub mod multicut;
pub mod see;
pub mod stack;
pub mod tt;
