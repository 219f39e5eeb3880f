/// Session and the one-chapter run.
pub mod run;
