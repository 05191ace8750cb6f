pub mod contifico;
