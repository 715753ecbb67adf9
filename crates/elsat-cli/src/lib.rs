//! # elsat CLI Library
//!
//! EL 推論器のコマンドラインインターフェース
//! オントロジーファイルを読み込み、概念の包摂子または全分類を出力

pub mod commands;

pub use commands::*;
