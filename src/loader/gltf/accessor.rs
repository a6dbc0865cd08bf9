use log::warn;

use super::document::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
}

impl ComponentType {
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            5120 => ComponentType::I8,
            5121 => ComponentType::U8,
            5122 => ComponentType::I16,
            5123 => ComponentType::U16,
            5124 => ComponentType::I32,
            5125 => ComponentType::U32,
            5126 => ComponentType::F32,
            _ => return None,
        })
    }

    pub fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::I32 | ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

/// Number of components of an accessor `type`. Unknown types count as
/// three components.
pub fn element_size(kind: &str) -> usize {
    match kind {
        "SCALAR" => 1,
        "VEC2" => 2,
        "VEC3" => 3,
        "VEC4" => 4,
        "MAT2" => 4,
        "MAT3" => 9,
        "MAT4" => 16,
        _ => 3,
    }
}

/// Accessor data in its stored component type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl TypedArray {
    fn from_bytes(component_type: ComponentType, bytes: &[u8]) -> Self {
        match component_type {
            ComponentType::I8 => TypedArray::I8(bytes.iter().map(|byte| *byte as i8).collect()),
            ComponentType::U8 => TypedArray::U8(bytes.to_vec()),
            ComponentType::I16 => TypedArray::I16(
                bytes
                    .chunks_exact(2)
                    .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
                    .collect(),
            ),
            ComponentType::U16 => TypedArray::U16(
                bytes
                    .chunks_exact(2)
                    .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
                    .collect(),
            ),
            ComponentType::I32 => TypedArray::I32(
                bytes
                    .chunks_exact(4)
                    .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                    .collect(),
            ),
            ComponentType::U32 => TypedArray::U32(
                bytes
                    .chunks_exact(4)
                    .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                    .collect(),
            ),
            ComponentType::F32 => TypedArray::F32(
                bytes
                    .chunks_exact(4)
                    .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                    .collect(),
            ),
        }
    }

    pub fn component_type(&self) -> ComponentType {
        match self {
            TypedArray::I8(_) => ComponentType::I8,
            TypedArray::U8(_) => ComponentType::U8,
            TypedArray::I16(_) => ComponentType::I16,
            TypedArray::U16(_) => ComponentType::U16,
            TypedArray::I32(_) => ComponentType::I32,
            TypedArray::U32(_) => ComponentType::U32,
            TypedArray::F32(_) => ComponentType::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TypedArray::I8(data) => data.len(),
            TypedArray::U8(data) => data.len(),
            TypedArray::I16(data) => data.len(),
            TypedArray::U16(data) => data.len(),
            TypedArray::I32(data) => data.len(),
            TypedArray::U32(data) => data.len(),
            TypedArray::F32(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded accessor. `data` holds `count * element_size` components.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAccessor {
    pub data: TypedArray,
    pub element_size: usize,
    pub count: usize,
    pub normalized: bool,
    pub min: Option<Vec<f32>>,
    pub max: Option<Vec<f32>>,
}

impl DecodedAccessor {
    /// Components as floats. Normalized integers map to `[0, 1]` or
    /// `[-1, 1]`.
    pub fn to_f32(&self) -> Vec<f32> {
        let normalized = self.normalized;
        match &self.data {
            TypedArray::F32(data) => data.clone(),
            TypedArray::I8(data) if normalized => data
                .iter()
                .map(|v| (*v as f32 / i8::MAX as f32).max(-1.0))
                .collect(),
            TypedArray::U8(data) if normalized => {
                data.iter().map(|v| *v as f32 / u8::MAX as f32).collect()
            }
            TypedArray::I16(data) if normalized => data
                .iter()
                .map(|v| (*v as f32 / i16::MAX as f32).max(-1.0))
                .collect(),
            TypedArray::U16(data) if normalized => {
                data.iter().map(|v| *v as f32 / u16::MAX as f32).collect()
            }
            TypedArray::I32(data) if normalized => data
                .iter()
                .map(|v| (*v as f64 / i32::MAX as f64).max(-1.0) as f32)
                .collect(),
            TypedArray::U32(data) if normalized => data
                .iter()
                .map(|v| (*v as f64 / u32::MAX as f64) as f32)
                .collect(),
            TypedArray::I8(data) => data.iter().map(|v| *v as f32).collect(),
            TypedArray::U8(data) => data.iter().map(|v| *v as f32).collect(),
            TypedArray::I16(data) => data.iter().map(|v| *v as f32).collect(),
            TypedArray::U16(data) => data.iter().map(|v| *v as f32).collect(),
            TypedArray::I32(data) => data.iter().map(|v| *v as f32).collect(),
            TypedArray::U32(data) => data.iter().map(|v| *v as f32).collect(),
        }
    }

    /// Unsigned integer components, for index and joint data.
    pub fn to_u32(&self) -> Option<Vec<u32>> {
        match &self.data {
            TypedArray::U8(data) => Some(data.iter().map(|v| *v as u32).collect()),
            TypedArray::U16(data) => Some(data.iter().map(|v| *v as u32).collect()),
            TypedArray::U32(data) => Some(data.clone()),
            _ => None,
        }
    }
}

/// Decode accessor `index` against resolved `buffers`.
///
/// Decoding is best effort: a missing accessor or buffer view, an unknown
/// component type or a read outside the buffer view logs a warning and
/// yields `None`.
pub fn decode_accessor(
    document: &Document,
    buffers: &[Vec<u8>],
    index: usize,
) -> Option<DecodedAccessor> {
    let Some(accessor) = document.accessors.get(index) else {
        warn!("Accessor #{} not found", index);
        return None;
    };
    let Some(component_type) = ComponentType::from_code(accessor.component_type) else {
        warn!(
            "Accessor #{} has unknown component type {}",
            index, accessor.component_type
        );
        return None;
    };
    let Some(view_index) = accessor.buffer_view else {
        warn!("Accessor #{} has no buffer view", index);
        return None;
    };
    let Some(view) = document.buffer_views.get(view_index) else {
        warn!("Buffer view #{} of accessor #{} not found", view_index, index);
        return None;
    };
    let Some(buffer) = buffers.get(view.buffer) else {
        warn!("Buffer #{} of buffer view #{} not found", view.buffer, view_index);
        return None;
    };
    let Some(view_data) = view
        .byte_offset
        .checked_add(view.byte_length)
        .and_then(|end| buffer.get(view.byte_offset..end))
    else {
        warn!(
            "Buffer view #{} is out of bounds of buffer #{} ({} bytes)",
            view_index,
            view.buffer,
            buffer.len()
        );
        return None;
    };

    let element_size = element_size(&accessor.kind);
    let element_bytes = element_size * component_type.size();
    let stride = view
        .byte_stride
        .filter(|stride| *stride > 0)
        .unwrap_or(element_bytes);
    let count = accessor.count;

    let mut bytes = Vec::new();
    if count > 0 {
        let end = (count - 1)
            .checked_mul(stride)
            .and_then(|last| last.checked_add(accessor.byte_offset))
            .and_then(|last| last.checked_add(element_bytes));
        if end.map_or(true, |end| end > view_data.len()) {
            warn!(
                "Accessor #{} reads past the end of buffer view #{}",
                index, view_index
            );
            return None;
        }
        // count is bounded by the view length from here on
        bytes.reserve_exact(count * element_bytes);
        if stride == element_bytes {
            bytes.extend_from_slice(
                &view_data[accessor.byte_offset..accessor.byte_offset + count * element_bytes],
            );
        } else {
            for element in 0..count {
                let start = accessor.byte_offset + element * stride;
                bytes.extend_from_slice(&view_data[start..start + element_bytes]);
            }
        }
    }

    Some(DecodedAccessor {
        data: TypedArray::from_bytes(component_type, &bytes),
        element_size,
        count,
        normalized: accessor.normalized,
        min: accessor.min.clone(),
        max: accessor.max.clone(),
    })
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn document(value: serde_json::Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|value| value.to_le_bytes()).collect()
    }

    #[test]
    fn test_element_size() {
        assert_eq!(element_size("SCALAR"), 1);
        assert_eq!(element_size("MAT3"), 9);
        assert_eq!(element_size("MAT4"), 16);
        assert_eq!(element_size("VEC9"), 3);
    }

    #[test]
    fn test_decode_typed() {
        let mut buffer = floats(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        buffer.extend_from_slice(&[1, 0, 2, 0, 3, 0]);
        let document = document(json!({
            "bufferViews": [
                {"buffer": 0, "byteLength": 24},
                {"buffer": 0, "byteOffset": 24, "byteLength": 6}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3",
                 "min": [1.0, 2.0, 3.0], "max": [4.0, 5.0, 6.0]},
                {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ]
        }));
        let buffers = vec![buffer];

        let positions = decode_accessor(&document, &buffers, 0).unwrap();
        assert_eq!(positions.data.len(), positions.count * positions.element_size);
        assert_eq!(
            positions.data,
            TypedArray::F32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        );
        assert_eq!(positions.max, Some(vec![4.0, 5.0, 6.0]));
        assert_eq!(positions.to_u32(), None);

        let indices = decode_accessor(&document, &buffers, 1).unwrap();
        assert_eq!(indices.data, TypedArray::U16(vec![1, 2, 3]));
        assert_eq!(indices.data.component_type(), ComponentType::U16);
        assert_eq!(indices.to_u32(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_decode_strided() {
        // Two VEC2 elements interleaved with 4 bytes of padding each
        let buffer = floats(&[1.0, 2.0, 9.0, 3.0, 4.0, 9.0]);
        let document = document(json!({
            "bufferViews": [{"buffer": 0, "byteLength": 24, "byteStride": 12}],
            "accessors": [{"bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC2"}]
        }));
        let decoded = decode_accessor(&document, &[buffer], 0).unwrap();
        assert_eq!(decoded.to_f32(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_decode_normalized() {
        let document = document(json!({
            "bufferViews": [{"buffer": 0, "byteLength": 4}],
            "accessors": [
                {"bufferView": 0, "componentType": 5121, "normalized": true, "count": 1, "type": "VEC4"},
                {"bufferView": 0, "componentType": 5120, "normalized": true, "count": 1, "type": "VEC4"}
            ]
        }));
        let buffers = vec![vec![0, 255, 127, 128]];
        let unsigned = decode_accessor(&document, &buffers, 0).unwrap().to_f32();
        assert_eq!(unsigned[0], 0.0);
        assert_eq!(unsigned[1], 1.0);
        let signed = decode_accessor(&document, &buffers, 1).unwrap().to_f32();
        assert_eq!(signed[0], 0.0);
        assert_eq!(signed[1], -1.0 / 127.0);
        assert_eq!(signed[2], 1.0);
        assert_eq!(signed[3], -1.0);
    }

    #[test]
    fn test_decode_failures() {
        let document = document(json!({
            "bufferViews": [{"buffer": 0, "byteLength": 8}],
            "accessors": [
                {"componentType": 5126, "count": 1, "type": "SCALAR"},
                {"bufferView": 0, "componentType": 1234, "count": 1, "type": "SCALAR"},
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "SCALAR"},
                {"bufferView": 1, "componentType": 5126, "count": 1, "type": "SCALAR"},
                {"bufferView": 0, "componentType": 5126, "count": 2, "type": "SCALAR"}
            ]
        }));
        let buffers = vec![vec![0; 8]];
        assert!(decode_accessor(&document, &buffers, 0).is_none());
        assert!(decode_accessor(&document, &buffers, 1).is_none());
        assert!(decode_accessor(&document, &buffers, 2).is_none());
        assert!(decode_accessor(&document, &buffers, 3).is_none());
        assert!(decode_accessor(&document, &buffers, 5).is_none());
        assert!(decode_accessor(&document, &buffers, 4).is_some());
        // The view itself lies outside a truncated buffer
        assert!(decode_accessor(&document, &[vec![0; 4]], 4).is_none());
    }

    #[test]
    fn test_decode_oversized_count() {
        let document = document(json!({
            "bufferViews": [{"buffer": 0, "byteLength": 12}],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 2305843009213693952u64, "type": "VEC3"},
                {"bufferView": 0, "componentType": 5126, "count": 1000000000000000u64, "type": "VEC3"},
                {"bufferView": 0, "componentType": 5126, "count": 1, "type": "VEC3"}
            ]
        }));
        let buffers = vec![vec![0; 12]];
        assert!(decode_accessor(&document, &buffers, 0).is_none());
        assert!(decode_accessor(&document, &buffers, 1).is_none());
        assert_eq!(decode_accessor(&document, &buffers, 2).unwrap().to_f32(), vec![0.0; 3]);
    }
}
