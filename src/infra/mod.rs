pub mod entsoe;
