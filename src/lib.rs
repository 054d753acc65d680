// Game-tree search core: PVS alpha-beta over cozy-chess boards with a shared
// lock-free transposition table.
pub mod board;
pub mod search;
