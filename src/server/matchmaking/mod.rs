/// Matchmaking module: FIFO pairing of anonymous players.

pub mod queue;
