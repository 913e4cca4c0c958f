#[derive(Debug, Clone)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub event: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GameData {
    pub metadata: GameMetadata,
    pub moves: Vec<String>, // SAN notation
    /// Start position followed by the position after each move
    pub fens: Vec<String>,
}
