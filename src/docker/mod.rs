pub mod client;
pub mod image;
pub mod inspect;
pub mod list;

#[cfg(test)]
pub mod fake;

pub use client::{ContainerEngine, DockerEngine};
pub use image::{find_images, format_images, inspect_image_by_name};
pub use inspect::inspect_all;
pub use list::{format_containers, select};
