//! Storage module for the flat string-table format

mod table;

pub use table::{
    ABSENT, Row, Table, combine, escape, load_table, parse_table, read_table, save_table,
    split_line, to_table_string, unescape, write_table,
};
