mod controls;
mod details;
mod overlays;
mod panels;
