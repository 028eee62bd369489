//! PLY (polygon file format) decoder.
//!
//! Supports the `ascii`, `binary_little_endian` and `binary_big_endian`
//! encodings. Reads `x/y/z` and optional `red/green/blue` from the vertex
//! element and polygon lists from the face element; everything else is
//! parsed and discarded.

use glam::Vec3;

use super::{compute_vertex_normals, MaterialDesc, MeshData};
use crate::error::AssetLoadError;
use crate::math::rgb_from_u32;

/// Flat material used when the cloud carries no vertex colors
const DEFAULT_PLY_COLOR: u32 = 0xaaaaaa;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "char" | "int8" => ScalarType::I8,
            "uchar" | "uint8" => ScalarType::U8,
            "short" | "int16" => ScalarType::I16,
            "ushort" | "uint16" => ScalarType::U16,
            "int" | "int32" => ScalarType::I32,
            "uint" | "uint32" => ScalarType::U32,
            "float" | "float32" => ScalarType::F32,
            "double" | "float64" => ScalarType::F64,
            _ => return None,
        })
    }

    fn is_integer(self) -> bool {
        !matches!(self, ScalarType::F32 | ScalarType::F64)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Property {
    Scalar { name: String, ty: ScalarType },
    List { name: String, count: ScalarType, item: ScalarType },
}

impl Property {
    fn name(&self) -> &str {
        match self {
            Property::Scalar { name, .. } | Property::List { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq)]
struct Header {
    encoding: Encoding,
    elements: Vec<Element>,
    body_offset: usize,
}

fn parse_header(bytes: &[u8]) -> Result<Header, String> {
    const END: &[u8] = b"end_header";

    let end = bytes
        .windows(END.len())
        .position(|w| w == END)
        .ok_or("missing end_header")?;

    // Body starts after the newline that terminates end_header
    let mut body_offset = end + END.len();
    if bytes.get(body_offset) == Some(&b'\r') {
        body_offset += 1;
    }
    if bytes.get(body_offset) == Some(&b'\n') {
        body_offset += 1;
    }

    let text = std::str::from_utf8(&bytes[..end]).map_err(|_| "header is not valid text")?;
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    if lines.next() != Some("ply") {
        return Err("missing ply magic".into());
    }

    let mut encoding = None;
    let mut elements: Vec<Element> = Vec::new();

    for line in lines {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("format") => {
                encoding = Some(match words.next() {
                    Some("ascii") => Encoding::Ascii,
                    Some("binary_little_endian") => Encoding::BinaryLittleEndian,
                    Some("binary_big_endian") => Encoding::BinaryBigEndian,
                    other => return Err(format!("unsupported format {:?}", other)),
                });
            }
            Some("element") => {
                let name = words.next().ok_or("element without name")?;
                let count = words
                    .next()
                    .and_then(|c| c.parse().ok())
                    .ok_or_else(|| format!("element {} has no count", name))?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            Some("property") => {
                let element = elements.last_mut().ok_or("property before any element")?;
                let property = match words.next() {
                    Some("list") => {
                        let count = words.next().and_then(ScalarType::parse);
                        let item = words.next().and_then(ScalarType::parse);
                        let name = words.next();
                        match (count, item, name) {
                            (Some(count), Some(item), Some(name)) => Property::List {
                                name: name.to_string(),
                                count,
                                item,
                            },
                            _ => return Err(format!("bad list property: {}", line)),
                        }
                    }
                    Some(ty) => {
                        let ty = ScalarType::parse(ty).ok_or_else(|| format!("unknown type {}", ty))?;
                        let name = words.next().ok_or("property without name")?;
                        Property::Scalar {
                            name: name.to_string(),
                            ty,
                        }
                    }
                    None => return Err("empty property line".into()),
                };
                element.properties.push(property);
            }
            Some("comment") | Some("obj_info") => {}
            Some(other) => log::debug!("ply: ignoring header keyword {}", other),
            None => {}
        }
    }

    Ok(Header {
        encoding: encoding.ok_or("missing format line")?,
        elements,
        body_offset,
    })
}

/// Source of body values, whichever the encoding
trait ValueReader {
    fn read(&mut self, ty: ScalarType) -> Result<f64, String>;
}

struct AsciiReader<'a> {
    tokens: std::str::SplitAsciiWhitespace<'a>,
}

impl ValueReader for AsciiReader<'_> {
    fn read(&mut self, _ty: ScalarType) -> Result<f64, String> {
        let token = self.tokens.next().ok_or("unexpected end of ascii body")?;
        token.parse().map_err(|_| format!("bad number {:?}", token))
    }
}

struct BinaryReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    big_endian: bool,
}

impl BinaryReader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], String> {
        let slice = self
            .bytes
            .get(self.pos..self.pos + N)
            .ok_or("unexpected end of binary body")?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }
}

macro_rules! read_num {
    ($reader:expr, $ty:ty, $size:literal) => {{
        let raw = $reader.take::<$size>()?;
        if $reader.big_endian {
            <$ty>::from_be_bytes(raw) as f64
        } else {
            <$ty>::from_le_bytes(raw) as f64
        }
    }};
}

impl ValueReader for BinaryReader<'_> {
    fn read(&mut self, ty: ScalarType) -> Result<f64, String> {
        Ok(match ty {
            ScalarType::I8 => read_num!(self, i8, 1),
            ScalarType::U8 => read_num!(self, u8, 1),
            ScalarType::I16 => read_num!(self, i16, 2),
            ScalarType::U16 => read_num!(self, u16, 2),
            ScalarType::I32 => read_num!(self, i32, 4),
            ScalarType::U32 => read_num!(self, u32, 4),
            ScalarType::F32 => read_num!(self, f32, 4),
            ScalarType::F64 => read_num!(self, f64, 8),
        })
    }
}

/// Vertex attribute slots resolved from property names
#[derive(Default)]
struct VertexLayout {
    xyz: [Option<usize>; 3],
    rgb: [Option<(usize, ScalarType)>; 3],
}

impl VertexLayout {
    fn from_element(element: &Element) -> Self {
        let mut layout = Self::default();
        for (i, property) in element.properties.iter().enumerate() {
            if let Property::Scalar { ty, .. } = property {
                match property.name() {
                    "x" => layout.xyz[0] = Some(i),
                    "y" => layout.xyz[1] = Some(i),
                    "z" => layout.xyz[2] = Some(i),
                    "red" | "r" => layout.rgb[0] = Some((i, *ty)),
                    "green" | "g" => layout.rgb[1] = Some((i, *ty)),
                    "blue" | "b" => layout.rgb[2] = Some((i, *ty)),
                    _ => {}
                }
            }
        }
        layout
    }

    fn has_colors(&self) -> bool {
        self.rgb.iter().all(Option::is_some)
    }
}

fn color_channel(value: f64, ty: ScalarType) -> f32 {
    if ty.is_integer() {
        (value / 255.0) as f32
    } else {
        value as f32
    }
}

#[derive(Debug, Default)]
struct PlyGeometry {
    positions: Vec<Vec3>,
    colors: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

fn read_body(header: &Header, reader: &mut dyn ValueReader) -> Result<PlyGeometry, String> {
    let mut geometry = PlyGeometry::default();
    let mut scalars = Vec::new();

    for element in &header.elements {
        let layout = (element.name == "vertex").then(|| VertexLayout::from_element(element));
        if let Some(layout) = &layout {
            if layout.xyz.iter().any(Option::is_none) {
                return Err("vertex element lacks x/y/z".into());
            }
        }

        for _ in 0..element.count {
            scalars.clear();
            let mut polygon: Vec<u32> = Vec::new();

            for property in &element.properties {
                match property {
                    Property::Scalar { ty, .. } => scalars.push(reader.read(*ty)?),
                    Property::List { name, count, item } => {
                        // Keep scalar indices aligned with property indices
                        scalars.push(0.0);
                        let n = reader.read(*count)?;
                        if n < 0.0 {
                            return Err(format!("negative list length in {}", name));
                        }
                        let is_face_list = element.name == "face"
                            && matches!(name.as_str(), "vertex_indices" | "vertex_index");
                        for _ in 0..n as usize {
                            let value = reader.read(*item)?;
                            if is_face_list {
                                if value < 0.0 {
                                    return Err("negative vertex index".into());
                                }
                                polygon.push(value as u32);
                            }
                        }
                    }
                }
            }

            if let Some(layout) = &layout {
                let [x, y, z] = layout.xyz.map(|slot| slot.map_or(0.0, |i| scalars[i] as f32));
                geometry.positions.push(Vec3::new(x, y, z));
                if layout.has_colors() {
                    let rgb = layout
                        .rgb
                        .map(|slot| slot.map_or(0.0, |(i, ty)| color_channel(scalars[i], ty)));
                    geometry.colors.push(rgb);
                }
            }

            // Fan triangulation
            for k in 1..polygon.len().saturating_sub(1) {
                geometry.indices.extend_from_slice(&[polygon[0], polygon[k], polygon[k + 1]]);
            }
        }
    }

    Ok(geometry)
}

/// Decodes a PLY file into a single mesh with synthesized vertex normals
pub fn decode_ply(path: &str, bytes: &[u8]) -> Result<MeshData, AssetLoadError> {
    let ply_error = |reason: String| AssetLoadError::Ply {
        path: path.to_string(),
        reason,
    };

    let header = parse_header(bytes).map_err(ply_error)?;
    let body = &bytes[header.body_offset.min(bytes.len())..];

    let geometry = match header.encoding {
        Encoding::Ascii => {
            let text = std::str::from_utf8(body).map_err(|_| ply_error("ascii body is not valid text".into()))?;
            let mut reader = AsciiReader {
                tokens: text.split_ascii_whitespace(),
            };
            read_body(&header, &mut reader)
        }
        Encoding::BinaryLittleEndian | Encoding::BinaryBigEndian => {
            let mut reader = BinaryReader {
                bytes: body,
                pos: 0,
                big_endian: header.encoding == Encoding::BinaryBigEndian,
            };
            read_body(&header, &mut reader)
        }
    }
    .map_err(ply_error)?;

    if geometry.positions.is_empty() {
        return Err(AssetLoadError::Empty { path: path.to_string() });
    }

    if geometry.indices.iter().any(|&i| i as usize >= geometry.positions.len()) {
        return Err(ply_error("face references a missing vertex".into()));
    }

    log::debug!(
        "ply {}: {} vertices, {} triangles, colors: {}",
        path,
        geometry.positions.len(),
        geometry.indices.len() / 3,
        !geometry.colors.is_empty()
    );

    let normals = compute_vertex_normals(&geometry.positions, &geometry.indices);
    let has_colors = !geometry.colors.is_empty();
    let base_color = if has_colors {
        [1.0, 1.0, 1.0, 1.0]
    } else {
        let [r, g, b] = rgb_from_u32(DEFAULT_PLY_COLOR);
        [r, g, b, 1.0]
    };

    Ok(MeshData {
        positions: geometry.positions,
        normals,
        colors: has_colors.then_some(geometry.colors),
        indices: geometry.indices,
        material: MaterialDesc {
            base_color,
            vertex_colors: has_colors,
        },
        cast_shadow: false,
        receive_shadow: false,
    })
}
