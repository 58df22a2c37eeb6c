//! A streaming KML document holding one filled hexagon per grid cell.
//!
//! Only what the fire risk map needs is here: a single folder of placemarks, each with an inline
//! style and one polygon. Nothing is buffered beyond the writer, so the caller must call
//! [KmlDocument::finish] to close the document, or the output is truncated.

use crate::{error::ForesightResult, grid::CellAggregate};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// A KML document being written to a file.
pub type KmlFile = KmlDocument<BufWriter<File>>;

pub struct KmlDocument<W: Write> {
    out: W,
    in_folder: bool,
}

impl KmlFile {
    /// Create the file and write the document header.
    pub fn create<P: AsRef<Path>>(pth: P) -> ForesightResult<Self> {
        let f = File::create(pth.as_ref())?;
        KmlDocument::new(BufWriter::new(f))
    }
}

impl<W: Write> KmlDocument<W> {
    /// Start a document on any writer.
    pub fn new(mut out: W) -> ForesightResult<Self> {
        const HEADER: &str = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#,
            "\n",
            "<Document>\n"
        );

        out.write_all(HEADER.as_bytes())?;

        Ok(KmlDocument {
            out,
            in_folder: false,
        })
    }

    /// Open the folder that holds the cells, it is shown expanded.
    pub fn start_folder(&mut self, name: &str, description: &str) -> ForesightResult<()> {
        writeln!(self.out, "<Folder>\n<name>{}</name>", name)?;
        self.write_description(description)?;
        writeln!(self.out, "<open>1</open>")?;
        self.in_folder = true;
        Ok(())
    }

    /// Close the folder opened by [KmlDocument::start_folder].
    pub fn finish_folder(&mut self) -> ForesightResult<()> {
        writeln!(self.out, "</Folder>")?;
        self.in_folder = false;
        Ok(())
    }

    /**
     * Write a placemark with the hexagon of a single cell.
     *
     * #Arguments
     * * cell - the cell, its id is the placemark name and its boundary the polygon.
     * * description - HTML shown in the balloon.
     * * fill - polygon fill in KML's aabbggrr format.
     * * outline - outline color in aabbggrr format.
     * * outline_width - outline width in pixels.
     */
    pub fn write_cell_polygon(
        &mut self,
        cell: &CellAggregate,
        description: &str,
        fill: &str,
        outline: &str,
        outline_width: f64,
    ) -> ForesightResult<()> {
        writeln!(self.out, "<Placemark>\n<name>{}</name>", cell.cell_id)?;
        self.write_description(description)?;

        writeln!(
            self.out,
            concat!(
                "<Style>\n",
                "<PolyStyle>\n<color>{}</color>\n<colorMode>normal</colorMode>\n",
                "<fill>1</fill>\n<outline>1</outline>\n</PolyStyle>\n",
                "<LineStyle>\n<color>{}</color>\n<width>{}</width>\n</LineStyle>\n",
                "</Style>"
            ),
            fill, outline, outline_width
        )?;

        self.out.write_all(
            concat!(
                "<Polygon>\n<tessellate>1</tessellate>\n",
                "<outerBoundaryIs>\n<LinearRing>\n<coordinates>\n"
            )
            .as_bytes(),
        )?;

        // KML wants longitude first.
        for vertex in &cell.boundary {
            writeln!(self.out, "{},{},0", vertex.lon, vertex.lat)?;
        }

        self.out.write_all(
            concat!(
                "</coordinates>\n</LinearRing>\n</outerBoundaryIs>\n</Polygon>\n",
                "</Placemark>\n"
            )
            .as_bytes(),
        )?;

        Ok(())
    }

    /// Close any open folder and the document, flush, and hand back the writer.
    pub fn finish(mut self) -> ForesightResult<W> {
        if self.in_folder {
            self.finish_folder()?;
        }

        self.out.write_all("</Document>\n</kml>\n".as_bytes())?;
        self.out.flush()?;

        Ok(self.out)
    }

    fn write_description(&mut self, description: &str) -> ForesightResult<()> {
        writeln!(
            self.out,
            "<description><![CDATA[{}]]></description>",
            description
        )?;
        Ok(())
    }
}
