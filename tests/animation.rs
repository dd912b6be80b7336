//! Texture SRT animation tests: shared tracks and the version gate.

use brres::g3d::{
    Keyframe, SrtAnimation, SrtAttribute, SrtMaterial, SrtMatrix, SrtTarget, SrtTrack, TransformModel,
};
use brres::{EncodeOptions, Error, SceneArchive};

fn ramp() -> SrtTrack {
    SrtTrack {
        step: 1.0 / 30.0,
        keyframes: vec![
            Keyframe { frame: 0.0, value: 0.0, tangent: 1.0 / 30.0 },
            Keyframe { frame: 30.0, value: 1.0, tangent: 1.0 / 30.0 },
        ],
        ..Default::default()
    }
}

/// Two materials scrolling with identical but separately stored tracks.
fn twin_scroll() -> SceneArchive {
    let mut anim = SrtAnimation::new("water");
    anim.frame_duration = 30;
    anim.transform_model = TransformModel::Xsi;
    for name in ["water_a", "water_b"] {
        let track = anim.add_track(ramp());
        let mut matrix = SrtMatrix::new();
        matrix.set(SrtTarget::TransV, SrtAttribute::Animated(track));
        let mut mat = SrtMaterial::new(name);
        mat.texture_matrices[1] = Some(matrix);
        anim.materials.push(mat);
    }
    SceneArchive { srt_animations: vec![anim], ..Default::default() }
}

#[test]
fn test_identical_tracks_merge_on_decode() {
    let scene = twin_scroll();
    assert_eq!(scene.srt_animations[0].tracks.len(), 2);
    let options = EncodeOptions { dedup_tracks: false, ..Default::default() };
    let plain = scene.to_bytes_with(&options).unwrap();
    let deduped = scene.to_bytes().unwrap();
    assert!(deduped.bytes.len() < plain.bytes.len());

    let decoded = SceneArchive::from_bytes(&plain.bytes).unwrap();
    let anim = decoded.archive.srt_animation("water").unwrap();
    assert_eq!(anim.tracks.len(), 1);
    for mat in &anim.materials {
        let matrix = mat.texture_matrices[1].as_ref().unwrap();
        assert_eq!(matrix.get(SrtTarget::TransV), SrtAttribute::Animated(0));
    }
    assert_eq!(anim.transform_model, TransformModel::Xsi);
}

#[test]
fn test_sampled_values() {
    let scene = twin_scroll();
    let decoded = SceneArchive::from_bytes(&scene.to_bytes().unwrap().bytes).unwrap();
    let anim = &decoded.archive.srt_animations[0];
    let matrix = anim.materials[0].texture_matrices[1].as_ref().unwrap();

    assert_eq!(matrix.value(SrtTarget::TransV, 0.0, &anim.tracks), 0.0);
    assert_eq!(matrix.value(SrtTarget::TransV, 45.0, &anim.tracks), 1.0);
    let mid = matrix.value(SrtTarget::TransV, 15.0, &anim.tracks);
    assert!((mid - 0.5).abs() < 1e-5, "{mid}");
    assert_eq!(matrix.value(SrtTarget::ScaleU, 10.0, &anim.tracks), 1.0);
    assert_eq!(matrix.value(SrtTarget::ScaleV, 10.0, &anim.tracks), 1.0);
    assert_eq!(matrix.value(SrtTarget::Rotate, 10.0, &anim.tracks), 0.0);
}

#[test]
fn test_srt_version_gate() {
    let mut bytes = twin_scroll().to_bytes().unwrap().bytes;
    let at = bytes.windows(4).position(|w| w == b"SRT0").unwrap();
    bytes[at + 8..at + 12].copy_from_slice(&4u32.to_be_bytes());

    let err = SceneArchive::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion { section: "SRT0", version: 4 }), "{err}");
}
