// Infrastructure layer: adapters, file I/O, HTML codec, eventing
pub mod event_ndjson;
pub mod file_store;
pub mod netscape_parser;
pub mod netscape_writer;
pub mod openai_provider;
pub mod schema_validator;
