pub mod circle_pack;
