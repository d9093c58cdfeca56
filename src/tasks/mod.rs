mod stream_scorer;

pub use stream_scorer::StreamScorer;
