pub mod inference; // LLM clients (hosted, Ollama, mock)
pub mod labeling; // batch labeling pipeline
