pub mod matcher;
pub mod normalize;
pub mod offset;
pub mod recovery;
pub mod syllables;
pub mod tempo;
