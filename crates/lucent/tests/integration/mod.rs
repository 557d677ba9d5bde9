mod config_file;
mod facets;
mod registry;
mod search;
