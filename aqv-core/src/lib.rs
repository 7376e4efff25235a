pub mod city;
pub mod dataset;
pub mod date_index;
pub mod observation;
pub mod pollutant;
pub mod region;
