#![allow(dead_code)]

pub mod db;
pub mod object_store;
pub mod probe;
