pub mod breakout;
pub mod snake;
