pub mod decode;
pub mod depth;
pub mod heal;
pub mod mask;
