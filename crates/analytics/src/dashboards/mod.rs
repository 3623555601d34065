pub mod d402_margin_trends;
