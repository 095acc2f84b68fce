//! Room designer: renders a described room through an LLM image tool and
//! re-renders it as components are added.

pub mod commands;
pub mod config;
pub mod designer;
pub mod llm;
pub mod logging;
pub mod scanner;
pub mod session;
pub mod shop;
