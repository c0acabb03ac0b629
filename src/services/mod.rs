pub mod container_provisioner;
pub mod image_transformer;
pub mod object_store_client;
pub mod pipeline;
pub mod temp_resources;
