pub mod diagram_canvas;
